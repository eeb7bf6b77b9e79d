// src/constants.rs

/// Entry holding the web server configuration.
pub const WEBSERVER_PROPERTIES: &str = "WEB-INF/webserver.properties";

/// Entry holding the web server library launched in server mode.
pub const WEBSERVER_JAR: &str = "WEB-INF/webserver.jar";

/// Prefix of entries that belong to the application root.
pub const APP_ROOT_PREFIX: &str = "WEB-INF";

/// Directory (relative to the work area) receiving bare top-level resources.
pub const PUBLIC_DIR: &str = "public";

/// Suffix of extracted files that are added to the loader search path.
pub const LIBRARY_SUFFIX: &str = ".jar";

/// Archive metadata that is never extracted.
pub const SKIPPED_ENTRIES: &[&str] = &["META-INF/MANIFEST.MF"];

/// Token separating launcher arguments from the executable to run.
pub const EXECUTABLE_SWITCH: &str = "-S";

/// Placeholder replaced by the capsule location.
pub const WARFILE_TOKEN: &str = "{{warfile}}";

/// Placeholder replaced by the absolute work area location.
pub const WEBROOT_TOKEN: &str = "{{webroot}}";

/// Configuration key naming the entry type to invoke.
pub const MAIN_CLASS_KEY: &str = "mainclass";

/// Configuration key listing, in order, the keys whose values prefix the server argv.
pub const ARGS_KEY: &str = "args";

/// Configuration key listing the keys promoted to process-wide settings.
pub const PROPS_KEY: &str = "props";

/// Environment variable overriding the capsule location.
pub const CAPSULE_ENV: &str = "WARBOOT_CAPSULE";

/// Environment variable with extra JVM options.
pub const JAVA_OPTS_ENV: &str = "WARBOOT_JAVA_OPTS";

/// Buffer size used when copying entries out of the capsule.
pub const COPY_BUFFER_SIZE: usize = 4096;
