use std::path::PathBuf;

pub const NOVA_FILE_EXTENSION: &str = "nv";
pub const PROJECT_FILE_NAME: &str = "nova.toml";
pub const IMPLICIT_ENTRY_METHOD_NAME: &str = "main";

/// Synthesized holder class for a compilation unit's top-level functions —
/// the JVM has no notion of a free function, so these are collected into one
/// `public final` class under this name (§4.3 Class emission).
pub const MODULE_CLASS_NAME: &str = "$Module";

// Rough heuristics for pre-sizing vectors built while walking the AST and
// project index, based on small test snippets. Recalculate if these turn out
// to be wrong in practice.
pub const TOKEN_TO_AST_NODE_RATIO: usize = 10;
pub const MINIMUM_LIKELY_CLASS_MEMBERS: usize = 6;
pub const PROJECT_INDEX_ENTRIES_PER_FILE: usize = 16;

/// The class-file target. Only Java 8 (major version 52) is supported, per
/// the bytecode-encoding contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JavaTarget {
    pub major_version: u16,
}

impl JavaTarget {
    pub const JAVA_8: JavaTarget = JavaTarget { major_version: 52 };
}

impl Default for JavaTarget {
    fn default() -> Self {
        JavaTarget::JAVA_8
    }
}

/// Project-level configuration, loaded from a `nova.toml` sitting next to the
/// entry source directory. Mirrors the shape of a per-project settings struct:
/// everything the pipeline needs to resolve files and classpath entries lives
/// here rather than being threaded through individual function calls.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_name: String,
    pub entry_dir: PathBuf,
    pub src: PathBuf,
    pub out_dir: PathBuf,
    /// Directories and jars visible to the Java-class resolver and to the
    /// LSP's `initializationOptions.classpath`.
    pub classpath: Vec<PathBuf>,
    pub java_target: JavaTarget,
}

impl Config {
    pub fn new(entry_dir: PathBuf) -> Self {
        Config {
            entry_dir,
            src: PathBuf::from("src"),
            out_dir: PathBuf::from("out"),
            classpath: Vec::new(),
            project_name: String::new(),
            java_target: JavaTarget::default(),
        }
    }

    /// Parses a `nova.toml` document into a `Config`, falling back to
    /// `entry_dir`'s defaults for any field the file omits.
    pub fn from_toml_str(entry_dir: PathBuf, contents: &str) -> Result<Self, toml::de::Error> {
        #[derive(serde::Deserialize, Default)]
        struct RawConfig {
            project_name: Option<String>,
            src: Option<PathBuf>,
            out_dir: Option<PathBuf>,
            classpath: Option<Vec<PathBuf>>,
        }

        let raw: RawConfig = toml::from_str(contents)?;
        let mut config = Config::new(entry_dir);
        if let Some(name) = raw.project_name {
            config.project_name = name;
        }
        if let Some(src) = raw.src {
            config.src = src;
        }
        if let Some(out_dir) = raw.out_dir {
            config.out_dir = out_dir;
        }
        if let Some(classpath) = raw.classpath {
            config.classpath = classpath;
        }
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let config = Config::from_toml_str(
            PathBuf::from("."),
            r#"
            project_name = "demo"
            classpath = ["libs/guava.jar"]
            "#,
        )
        .unwrap();
        assert_eq!(config.project_name, "demo");
        assert_eq!(config.classpath, vec![PathBuf::from("libs/guava.jar")]);
        assert_eq!(config.src, PathBuf::from("src"));
    }

    #[test]
    fn defaults_to_java_8() {
        assert_eq!(Config::default().java_target, JavaTarget::JAVA_8);
    }
}
