// src/system/jvm.rs

//! JVM-backed implementations of the runtime seams.
//!
//! The web server library and the JRuby runtime are Java archives, so both are
//! started as a `java` child process whose class path is the library search path.
//! Process-wide settings are forwarded as `-Dkey=value` system properties.

use crate::constants::JAVA_OPTS_ENV;
use crate::core::runtime::{
    ComponentLoader, EntryPoint, RuntimeProvider, ScriptRuntime, ScriptValue,
};
use crate::core::settings;
use crate::system::executor::{self, ExecutionError, ProcessSpec};
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

const JRUBY_MAIN: &str = "org.jruby.Main";
const RESULT_MARKER: &str = "__WARBOOT_RESULT__";

lazy_static! {
    static ref TYPE_NAME: Regex = Regex::new(r"^[A-Za-z_$][\w$]*(\.[A-Za-z_$][\w$]*)*$")
        .expect("type name pattern is valid");
}

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Could not find a 'java' executable. Set JAVA_HOME or add java to PATH.")]
    JavaNotFound,
    #[error("Could not parse WARBOOT_JAVA_OPTS: '{0}'")]
    InvalidJavaOptions(String),
    #[error("Library search path cannot be used as a class path: {0}")]
    ClassPath(#[from] env::JoinPathsError),
    #[error("'{0}' is not a valid entry type name")]
    InvalidTypeName(String),
    #[error("Could not stage script '{name}': {source}")]
    Staging {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Provides JVM-backed loaders and JRuby runtimes.
#[derive(Debug, Clone, Default)]
pub struct JvmProvider {
    java_home: Option<PathBuf>,
    jvm_options: Vec<String>,
}

impl JvmProvider {
    /// Reads `JAVA_HOME` and `WARBOOT_JAVA_OPTS`. The `java` binary itself is only
    /// looked up when a component is about to be started.
    pub fn from_env() -> Result<Self, AdapterError> {
        let jvm_options = match env::var(JAVA_OPTS_ENV) {
            Ok(raw) => shlex::split(&raw).ok_or(AdapterError::InvalidJavaOptions(raw))?,
            Err(_) => Vec::new(),
        };
        Ok(Self {
            java_home: env::var_os("JAVA_HOME")
                .filter(|home| !home.is_empty())
                .map(PathBuf::from),
            jvm_options,
        })
    }

    fn java_binary(&self) -> Result<PathBuf, AdapterError> {
        let name = if cfg!(target_os = "windows") {
            "java.exe"
        } else {
            "java"
        };
        if let Some(home) = &self.java_home {
            let candidate = home.join("bin").join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
            log::debug!("No java binary under JAVA_HOME ({})", home.display());
        }
        executor::find_in_path(name).ok_or(AdapterError::JavaNotFound)
    }

    fn jvm(&self, search_path: &[PathBuf]) -> Result<Jvm, AdapterError> {
        Ok(Jvm {
            java: self.java_binary()?,
            options: self.jvm_options.clone(),
            classpath: env::join_paths(search_path)?,
        })
    }
}

impl RuntimeProvider for JvmProvider {
    fn component_loader(&self, search_path: &[PathBuf]) -> Result<Box<dyn ComponentLoader>> {
        Ok(Box::new(JvmComponentLoader {
            jvm: self.jvm(search_path)?,
        }))
    }

    fn script_runtime(&self, search_path: &[PathBuf]) -> Result<Box<dyn ScriptRuntime>> {
        Ok(Box::new(JRubyRuntime::new(self.jvm(search_path)?)))
    }
}

/// A `java` invocation template.
#[derive(Debug, Clone)]
struct Jvm {
    java: PathBuf,
    options: Vec<String>,
    classpath: OsString,
}

impl Jvm {
    fn spec(&self, main_class: &str) -> ProcessSpec {
        let mut spec = ProcessSpec::new(&self.java);
        spec.args(&self.options);
        spec.args(
            settings::snapshot()
                .into_iter()
                .map(|(key, value)| format!("-D{}={}", key, value)),
        );
        spec.arg("-cp").arg(self.classpath.clone()).arg(main_class);
        spec
    }
}

#[derive(Debug)]
struct JvmComponentLoader {
    jvm: Jvm,
}

impl ComponentLoader for JvmComponentLoader {
    fn resolve(&self, type_name: &str) -> Result<Box<dyn EntryPoint>> {
        if !TYPE_NAME.is_match(type_name) {
            return Err(AdapterError::InvalidTypeName(type_name.to_string()).into());
        }
        Ok(Box::new(JvmEntryPoint {
            jvm: self.jvm.clone(),
            main_class: type_name.to_string(),
        }))
    }
}

/// The static `main(String[])` of a class, run in its own JVM.
#[derive(Debug)]
struct JvmEntryPoint {
    jvm: Jvm,
    main_class: String,
}

impl EntryPoint for JvmEntryPoint {
    fn invoke(&self, argv: &[String]) -> Result<Option<i32>> {
        let mut spec = self.jvm.spec(&self.main_class);
        spec.args(argv);
        Ok(executor::execute(&spec)?)
    }
}

/// A JRuby runtime driven through `org.jruby.Main`.
#[derive(Debug)]
struct JRubyRuntime {
    jvm: Jvm,
    argv: Vec<String>,
    cwd: Option<PathBuf>,
    inherit_env: bool,
    options: Vec<String>,
}

impl JRubyRuntime {
    fn new(jvm: Jvm) -> Self {
        Self {
            jvm,
            argv: Vec::new(),
            cwd: None,
            inherit_env: true,
            options: Vec::new(),
        }
    }

    fn spec(&self) -> ProcessSpec {
        let mut spec = self.jvm.spec(JRUBY_MAIN);
        spec.args(&self.options);
        spec.cwd = self.cwd.clone();
        spec.inherit_env = self.inherit_env;
        spec
    }
}

impl ScriptRuntime for JRubyRuntime {
    fn set_argv(&mut self, argv: &[String]) {
        self.argv = argv.to_vec();
    }

    fn set_current_directory(&mut self, dir: &Path) {
        self.cwd = Some(dir.to_path_buf());
    }

    fn set_inherit_environment(&mut self, inherit: bool) {
        self.inherit_env = inherit;
    }

    fn process_arguments(&mut self, args: &[String]) -> Result<()> {
        self.options.extend(args.iter().cloned());
        Ok(())
    }

    fn run_scriptlet(&mut self, script: &str) -> Result<ScriptValue> {
        let mut spec = self.spec();
        spec.arg("-e").arg(wrap_scriptlet(script));
        let output = executor::execute_and_capture_output(&spec)?;
        Ok(parse_scriptlet_output(&output))
    }

    /// The prelude is required ahead of the script, which runs from its own path
    /// so `$0` and `__FILE__` name the resolved executable. A script that is not
    /// a file on disk is staged together with the prelude instead.
    fn run_from_main(
        &mut self,
        prelude: &str,
        script: &[u8],
        script_name: &str,
    ) -> Result<ScriptValue> {
        let dir = self.cwd.clone().unwrap_or_else(env::temp_dir);
        let stage = |name: &str, content: &[u8]| {
            executor::write_temp_script(&dir, name, content).map_err(|e| AdapterError::Staging {
                name: script_name.to_string(),
                source: e,
            })
        };

        let mut spec = self.spec();
        // Held until the child has exited.
        let _staged = if Path::new(script_name).is_file() {
            let staged = stage("prelude.rb", prelude.as_bytes())?;
            spec.arg("-r").arg(staged.as_os_str()).arg(script_name);
            staged
        } else {
            log::debug!("{} is not on disk, staging it with the prelude", script_name);
            let file_name = Path::new(script_name)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "main".to_string());
            let mut source = prelude.as_bytes().to_vec();
            source.extend_from_slice(script);
            let staged = stage(&file_name, &source)?;
            spec.arg(staged.as_os_str());
            staged
        };
        spec.args(&self.argv);

        let code = executor::execute(&spec)?;
        Ok(code.map_or(ScriptValue::Nil, ScriptValue::Integer))
    }
}

/// Wraps a scriptlet so its value is reported after a marker on stdout.
fn wrap_scriptlet(script: &str) -> String {
    format!(
        "__warboot_result = begin\n{script}\nend\n\
         __warboot_tag = case __warboot_result\n\
         when nil then 'n:'\n\
         when Integer then \"i:#{{__warboot_result}}\"\n\
         else \"s:#{{__warboot_result}}\"\n\
         end\n\
         STDOUT.print(\"\\n{RESULT_MARKER}\" + __warboot_tag)\n"
    )
}

fn parse_scriptlet_output(output: &str) -> ScriptValue {
    let Some((noise, tagged)) = output.rsplit_once(RESULT_MARKER) else {
        log::debug!("Scriptlet produced no result marker");
        return ScriptValue::Nil;
    };
    if !noise.trim().is_empty() {
        log::debug!("Scriptlet output: {}", noise.trim());
    }
    if let Some(number) = tagged.strip_prefix("i:") {
        return number
            .trim()
            .parse()
            .map_or(ScriptValue::Nil, ScriptValue::Integer);
    }
    if let Some(text) = tagged.strip_prefix("s:") {
        return ScriptValue::Text(text.to_string());
    }
    ScriptValue::Nil
}
