// src/core/server_launcher.rs

use crate::constants::{ARGS_KEY, MAIN_CLASS_KEY};
use crate::core::runtime::ComponentLoader;
use crate::core::webserver_config::WebServerConfig;
use anyhow::Result;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(
        "unknown webserver main class (WEB-INF/webserver.properties is missing 'mainclass' property)"
    )]
    MissingMainClass,
}

/// Builds the server's argument vector.
///
/// When `args` lists key names, their values (empty when unset) come first, in
/// the listed order, followed by the launcher arguments. Otherwise the launcher
/// arguments pass through unchanged.
pub fn server_arguments(config: &WebServerConfig, launcher_args: &[String]) -> Vec<String> {
    let Some(names) = config.list(ARGS_KEY) else {
        return launcher_args.to_vec();
    };
    names
        .into_iter()
        .map(|name| config.get(name).unwrap_or_default().to_string())
        .chain(launcher_args.iter().cloned())
        .collect()
}

/// Resolves the configured entry type and invokes it once.
///
/// Whatever the component raises is returned untouched; there is no retry.
pub fn launch_web_server(
    loader: &dyn ComponentLoader,
    config: &WebServerConfig,
    launcher_args: &[String],
) -> Result<i32> {
    let main_class = config
        .get(MAIN_CLASS_KEY)
        .ok_or(ConfigurationError::MissingMainClass)?;
    let entry_point = loader.resolve(main_class)?;

    let argv = server_arguments(config, launcher_args);
    log::debug!("invoking webserver with: {:?}", argv);
    let status = entry_point.invoke(&argv)?;
    Ok(status.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runtime::RuntimeProvider;
    use crate::core::runtime::testing::FakeProvider;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_declared_arguments_prefix_launcher_arguments() {
        let config = WebServerConfig::parse("args = args0,args1\nargs0 = --a\nargs1 = --b\n");
        assert_eq!(
            server_arguments(&config, &args(&["x"])),
            args(&["--a", "--b", "x"])
        );
    }

    #[test]
    fn test_unset_argument_names_resolve_to_empty() {
        let config = WebServerConfig::parse("args = args0,args9\nargs0 = --a\n");
        assert_eq!(server_arguments(&config, &[]), args(&["--a", ""]));
    }

    #[test]
    fn test_arguments_pass_through_without_list() {
        let config = WebServerConfig::parse("mainclass = winstone.Launcher\n");
        assert_eq!(
            server_arguments(&config, &args(&["--httpPort=9090"])),
            args(&["--httpPort=9090"])
        );
    }

    #[test]
    fn test_launch_invokes_resolved_entry_point() {
        let provider = FakeProvider {
            invoke_status: Some(3),
            ..Default::default()
        };
        let loader = provider.component_loader(&[]).unwrap();
        let config = WebServerConfig::parse(
            "mainclass = winstone.Launcher\nargs = args0\nargs0 = --warfile=/deploy/app.war\n",
        );

        let status = launch_web_server(loader.as_ref(), &config, &args(&["--debug"])).unwrap();

        assert_eq!(status, 3);
        let recording = provider.recording();
        assert_eq!(recording.resolved_type.as_deref(), Some("winstone.Launcher"));
        assert_eq!(
            recording.invoked_argv,
            Some(args(&["--warfile=/deploy/app.war", "--debug"]))
        );
    }

    #[test]
    fn test_missing_status_is_success() {
        let provider = FakeProvider::default();
        let loader = provider.component_loader(&[]).unwrap();
        let config = WebServerConfig::parse("mainclass = a.B\n");
        assert_eq!(launch_web_server(loader.as_ref(), &config, &[]).unwrap(), 0);
    }

    #[test]
    fn test_missing_main_class_is_fatal_before_invocation() {
        let provider = FakeProvider::default();
        let loader = provider.component_loader(&[]).unwrap();

        let err = launch_web_server(loader.as_ref(), &WebServerConfig::default(), &[]).unwrap_err();

        assert_eq!(
            err.downcast_ref::<ConfigurationError>(),
            Some(&ConfigurationError::MissingMainClass)
        );
        assert!(provider.recording().invoked_argv.is_none());
    }

    #[test]
    fn test_component_failure_propagates_unchanged() {
        let provider = FakeProvider {
            invoke_fails: true,
            ..Default::default()
        };
        let loader = provider.component_loader(&[]).unwrap();
        let config = WebServerConfig::parse("mainclass = a.B\n");

        let err = launch_web_server(loader.as_ref(), &config, &[]).unwrap_err();
        assert_eq!(err.to_string(), "server crashed");
    }
}
