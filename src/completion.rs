//! # Shell Completion Module
//!
//! Standard completion scripts come from `clap_complete`. The enhanced bash
//! and fish scripts also complete listener ids for `discover`, `radio` and
//! `similar` by calling the hidden `complete-listeners` command, which reads
//! the same catalog snapshot as every other command.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! tastemap completion bash > ~/.local/share/bash-completion/completions/tastemap
//!
//! # Generate zsh completions
//! tastemap completion zsh > ~/.config/zsh/completions/_tastemap
//!
//! # Bash completions with listener ids
//! tastemap completion-enhanced bash > ~/.local/share/bash-completion/completions/tastemap
//! ```

use crate::store::{CatalogSnapshot, CatalogStore, MemoryStore};
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io;
use std::path::Path;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Enhanced bash completion script with listener id completion
#[must_use]
pub fn enhanced_bash_completion() -> &'static str {
    r#"#!/bin/bash
# tastemap completion with listener ids
# Install with: tastemap completion-enhanced bash > ~/.local/share/bash-completion/completions/tastemap

_tastemap_complete_listeners() {
    local catalog=() i
    for ((i = 1; i < ${#COMP_WORDS[@]} - 1; i++)); do
        if [[ "${COMP_WORDS[i]}" == "--catalog" ]]; then
            catalog=(--catalog "${COMP_WORDS[i+1]}")
        fi
    done
    tastemap "${catalog[@]}" complete-listeners 2>/dev/null
}

_tastemap() {
    local cur prev words cword
    _init_completion || return

    case "${prev}" in
        --catalog|--config)
            _filedir json
            return 0
            ;;
        discover|radio|similar)
            mapfile -t COMPREPLY < <(compgen -W "$(_tastemap_complete_listeners)" -- "${cur}")
            return 0
            ;;
        completion|completion-enhanced)
            COMPREPLY=($(compgen -W "bash zsh fish power-shell elvish" -- "${cur}"))
            return 0
            ;;
    esac

    local subcommands="discover radio similar stats completion completion-enhanced help"
    case "${cur}" in
        -*)
            COMPREPLY=($(compgen -W "--catalog --config --seed --limit --seed-track --help --version" -- "${cur}"))
            ;;
        *)
            COMPREPLY=($(compgen -W "$subcommands" -- "${cur}"))
            ;;
    esac
} &&
complete -F _tastemap tastemap

# ex: filetype=sh
"#
}

/// Enhanced fish completion script with listener id completion
#[must_use]
pub fn enhanced_fish_completion() -> &'static str {
    r#"# tastemap completion for fish with listener ids
# Install with: tastemap completion-enhanced fish > ~/.config/fish/completions/tastemap.fish

function __tastemap_complete_listeners
    set -l catalog (string replace -r -- '.*--catalog[ =](\S+).*' '$1' (commandline -p))
    if test -f "$catalog"
        tastemap --catalog $catalog complete-listeners 2>/dev/null
    else
        tastemap complete-listeners 2>/dev/null
    end
end

complete -c tastemap -e
complete -c tastemap -l catalog -r -F -d 'JSON catalog snapshot'
complete -c tastemap -l config -r -F -d 'Engine config file'
complete -c tastemap -l seed -x -d 'Fixed shuffle seed'

complete -c tastemap -f -n '__fish_use_subcommand' -a discover -d 'Generate a weekly discovery list'
complete -c tastemap -f -n '__fish_use_subcommand' -a radio -d 'Generate a radio list around a seed track'
complete -c tastemap -f -n '__fish_use_subcommand' -a similar -d 'List the most similar listeners'
complete -c tastemap -f -n '__fish_use_subcommand' -a stats -d 'Print graph and cache statistics'
complete -c tastemap -f -n '__fish_use_subcommand' -a completion -d 'Generate shell completions'
complete -c tastemap -f -n '__fish_use_subcommand' -a completion-enhanced -d 'Generate completions with listener ids'

complete -c tastemap -f -n '__fish_seen_subcommand_from discover radio similar' -a '(__tastemap_complete_listeners)' -d 'Listener'
complete -c tastemap -f -n '__fish_seen_subcommand_from discover radio similar' -s l -l limit -x -d 'Number of results'
complete -c tastemap -f -n '__fish_seen_subcommand_from radio' -l seed-track -x -d 'Seed track id'
complete -c tastemap -f -n '__fish_seen_subcommand_from completion completion-enhanced' -a 'bash zsh fish power-shell elvish'
"#
}

/// Convert our Shell enum to clap_complete's Shell enum
#[must_use]
pub fn shell_to_completion_shell(shell: crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Listener ids in ascending order, one completion each.
#[must_use]
pub fn listener_completions(store: &dyn CatalogStore) -> Vec<String> {
    let mut ids: Vec<_> = store.all_listeners().into_iter().map(|l| l.id).collect();
    ids.sort_unstable();
    ids.into_iter().map(|id| id.to_string()).collect()
}

/// Listener completions for the snapshot at `catalog`.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded.
pub fn catalog_listener_completions(catalog: &Path) -> Result<Vec<String>> {
    let store = MemoryStore::from_snapshot(CatalogSnapshot::load(catalog)?);
    Ok(listener_completions(&store))
}

/// Prints listener completions, one per line. A missing or unreadable
/// catalog prints nothing.
pub fn print_listener_completions(catalog: Option<&Path>) {
    let completions = catalog
        .and_then(|path| catalog_listener_completions(path).ok())
        .unwrap_or_default();
    for completion in completions {
        println!("{completion}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Listener;
    use clap::CommandFactory;

    #[test]
    fn test_shell_conversion() {
        assert_eq!(shell_to_completion_shell(crate::cli::Shell::Bash), CompletionShell::Bash);
        assert_eq!(shell_to_completion_shell(crate::cli::Shell::Zsh), CompletionShell::Zsh);
    }

    #[test]
    fn test_listener_completions_sorted() {
        let store = MemoryStore::new();
        for id in [30, 4, 12] {
            store.upsert_listener(Listener::new(id));
        }
        assert_eq!(listener_completions(&store), vec!["4", "12", "30"]);
    }

    #[test]
    fn test_enhanced_scripts_call_listener_helper() {
        let cmd = crate::cli::Args::command();
        assert!(cmd.get_subcommands().any(|sub| sub.get_name() == "complete-listeners"));

        for script in [enhanced_bash_completion(), enhanced_fish_completion()] {
            assert!(script.contains("complete-listeners 2>/dev/null"));
            assert!(script.contains("discover"));
        }
        assert!(enhanced_bash_completion().contains("complete -F _tastemap tastemap"));
    }

    #[test]
    fn test_missing_catalog_is_an_error() {
        assert!(catalog_listener_completions(Path::new("/nonexistent/catalog.json")).is_err());
    }
}
