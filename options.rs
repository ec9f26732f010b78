//! Parses the `-agentlib:`/`-agentpath:` options string (`key=value,key2`
//! form, the conventional JVMTI agent options grammar). The teacher has no
//! parser of its own to generalize here — it's a library, not a standalone
//! agent — so this is new, built in the spirit of `build.rs`'s own
//! line-by-line parsing of subprocess output rather than reaching for a
//! parsing crate for a one-shot, comma-separated grammar.

/// Boolean flags accepted at agent load time. Per spec.md §6 ("Process-level
/// surface"), these gate optional components but never change core
/// semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentOptions {
    /// Enables [`crate::classloader_discovery`]: installing a `loadClass`
    /// hook into every classloader subclass, keyed off class-prepare
    /// events. Off by default.
    pub classloader_discovery: bool,
}

impl AgentOptions {
    /// Parses the options string the JVM passes to `Agent_OnLoad`. Unknown
    /// keys are logged and ignored rather than rejected, since a newer
    /// launcher passing a flag this build doesn't know about should not
    /// prevent the agent from loading.
    pub fn parse(options: &str) -> Self {
        let mut parsed = Self::default();
        for entry in options.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (key, value) = match entry.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (entry, "true"),
            };
            match key {
                "classloader-discovery" | "classloaderDiscovery" => {
                    parsed.classloader_discovery = is_truthy(value);
                }
                other => crate::log_warn!("ignoring unrecognized agent option {other:?}"),
            }
        }
        parsed
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_disable_classloader_discovery() {
        assert_eq!(AgentOptions::parse(""), AgentOptions::default());
    }

    #[test]
    fn bare_flag_enables_classloader_discovery() {
        let opts = AgentOptions::parse("classloader-discovery");
        assert!(opts.classloader_discovery);
    }

    #[test]
    fn key_value_form_is_accepted() {
        let opts = AgentOptions::parse("classloaderDiscovery=true");
        assert!(opts.classloader_discovery);
        let opts = AgentOptions::parse("classloaderDiscovery=false");
        assert!(!opts.classloader_discovery);
    }

    #[test]
    fn unknown_keys_are_ignored_not_rejected() {
        let opts = AgentOptions::parse("classloader-discovery,somethingNew=42");
        assert!(opts.classloader_discovery);
    }

    #[test]
    fn whitespace_around_entries_is_tolerated() {
        let opts = AgentOptions::parse(" classloader-discovery = true , ");
        assert!(opts.classloader_discovery);
    }
}
