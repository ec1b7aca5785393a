use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};

use weather_forecast::{
    config::{RuntimeConfig, WEATHER_LOG_ENV},
    error::{AppError, ErrorKind},
    model::{DEFAULT_FORECAST_DAYS, ForecastRequest, ForecastView, TimeResolution, ValidationError},
    providers::{ForecastApi, GeocodingApi, HttpProviders},
    render::{self, Palette, strip_ansi},
    service::{self, FileStores},
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Console weather forecast (Positionstack geocoding, Open-Meteo data)"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Store the Positionstack access key.
    Init {
        /// Key to store; prompted for on stdin when omitted.
        #[arg(long)]
        access_key: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Forecast for a location.
    Forecast {
        /// Free-text location, e.g. "Berlin" or "Paris, France".
        location: String,
        #[arg(long, value_name = "YYYY-MM-DD")]
        start_date: Option<String>,
        #[arg(long, default_value_t = DEFAULT_FORECAST_DAYS)]
        days: u32,
        #[arg(long, value_enum, ignore_case = true, default_value_t = ResolutionArg::OneDay)]
        resolution: ResolutionArg,
        /// Also write the plain-text rendering to PATH.
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        no_color: bool,
    },
}

const ENVELOPE_SCHEMA_VERSION: &str = "v1";
const ERROR_CODE_USER_INVALID_INPUT: &str = "user.invalid_input";
const ERROR_CODE_CONFIG_MISSING: &str = "config.missing";
const ERROR_CODE_CONFIG_CORRUPTED: &str = "config.corrupted";
const ERROR_CODE_GEOCODING: &str = "geocoding.failed";
const ERROR_CODE_FORECAST_PROVIDER: &str = "forecast.provider_failed";
const ERROR_CODE_DATA_INTEGRITY: &str = "forecast.data_integrity";
const ERROR_CODE_RUNTIME_IO: &str = "runtime.io";
const ERROR_CODE_RUNTIME_PROVIDER_INIT: &str = "runtime.provider_init_failed";
const ERROR_CODE_RUNTIME_SERIALIZE: &str = "runtime.serialize_failed";
const ERROR_CODE_RUNTIME_EXPORT: &str = "runtime.export_failed";
const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ResolutionArg {
    #[value(name = "1h")]
    OneHour,
    #[value(name = "2h")]
    TwoHours,
    #[value(name = "3h")]
    ThreeHours,
    #[value(name = "4h")]
    FourHours,
    #[value(name = "6h")]
    SixHours,
    #[value(name = "12h")]
    TwelveHours,
    #[value(name = "1d")]
    OneDay,
}

impl From<ResolutionArg> for ForecastView {
    fn from(value: ResolutionArg) -> Self {
        match value {
            ResolutionArg::OneHour => ForecastView::Detailed(TimeResolution::OneHour),
            ResolutionArg::TwoHours => ForecastView::Detailed(TimeResolution::TwoHours),
            ResolutionArg::ThreeHours => ForecastView::Detailed(TimeResolution::ThreeHours),
            ResolutionArg::FourHours => ForecastView::Detailed(TimeResolution::FourHours),
            ResolutionArg::SixHours => ForecastView::Detailed(TimeResolution::SixHours),
            ResolutionArg::TwelveHours => ForecastView::Detailed(TimeResolution::TwelveHours),
            ResolutionArg::OneDay => ForecastView::Summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliError {
    kind: ErrorKind,
    code: &'static str,
    message: String,
}

impl CliError {
    fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl Cli {
    fn command_name(&self) -> &'static str {
        match &self.command {
            Commands::Init { .. } => "weather.init",
            Commands::Forecast { .. } => "weather.forecast",
        }
    }

    fn json_output(&self) -> bool {
        match &self.command {
            Commands::Init { json, .. } | Commands::Forecast { json, .. } => *json,
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let command = cli.command_name();
    let json_output = cli.json_output();
    match run(cli) {
        Ok(output) => println!("{output}"),
        Err(error) => {
            emit_error(command, json_output, &error);
            std::process::exit(error.exit_code());
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(WEATHER_LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<String, CliError> {
    let mut config = RuntimeConfig::from_env();
    if !io::stdout().is_terminal() {
        config.color = false;
    }
    let providers = HttpProviders::new(config.http_timeout_secs).map_err(|error| {
        CliError::new(
            ErrorKind::Runtime,
            ERROR_CODE_RUNTIME_PROVIDER_INIT,
            error.to_string(),
        )
    })?;
    run_with(cli, &config, &providers, Utc::now, &mut io::stdin().lock())
}

fn run_with<P, N, R>(
    cli: Cli,
    config: &RuntimeConfig,
    providers: &P,
    now_fn: N,
    input: &mut R,
) -> Result<String, CliError>
where
    P: GeocodingApi + ForecastApi,
    N: Fn() -> DateTime<Utc>,
    R: BufRead,
{
    let stores = FileStores::from_config(config);

    match cli.command {
        Commands::Init { access_key, json } => {
            let access_key = match access_key {
                Some(access_key) => access_key,
                None => prompt_access_key(input)?,
            };
            service::save_credentials(&stores.credentials, &access_key).map_err(map_app_error)?;

            let path = stores.credentials.path();
            if json {
                render_json_envelope(
                    "weather.init",
                    json!({ "config_path": path.display().to_string() }),
                )
            } else {
                Ok(format!("saved access key to {}", path.display()))
            }
        }
        Commands::Forecast {
            location,
            start_date,
            days,
            resolution,
            export,
            json,
            no_color,
        } => {
            let request =
                ForecastRequest::new(&location, start_date.as_deref(), days, resolution.into())
                    .map_err(user_invalid_input)?;
            let report = service::run_forecast(providers, &stores, now_fn(), &request)
                .map_err(map_app_error)?;

            if let Some(path) = export.as_deref() {
                export_text(path, &render::render_report(&report, Palette::plain()))?;
            }

            if json {
                let result = serde_json::to_value(report.to_output()).map_err(|error| {
                    CliError::new(
                        ErrorKind::Runtime,
                        ERROR_CODE_RUNTIME_SERIALIZE,
                        format!("failed to serialize output: {error}"),
                    )
                })?;
                render_json_envelope("weather.forecast", result)
            } else {
                let palette = Palette::new(config.color && !no_color);
                Ok(render::render_report(&report, palette))
            }
        }
    }
}

fn prompt_access_key<R: BufRead>(input: &mut R) -> Result<String, CliError> {
    eprint!("Positionstack access key: ");
    let _ = io::stderr().flush();

    let mut line = String::new();
    input.read_line(&mut line).map_err(|error| {
        CliError::new(
            ErrorKind::Runtime,
            ERROR_CODE_RUNTIME_IO,
            format!("failed to read access key: {error}"),
        )
    })?;
    Ok(line.trim().to_string())
}

fn export_text(path: &Path, rendered: &str) -> Result<(), CliError> {
    let mut text = strip_ansi(rendered);
    text.push('\n');
    std::fs::write(path, text).map_err(|error| {
        CliError::new(
            ErrorKind::Runtime,
            ERROR_CODE_RUNTIME_EXPORT,
            format!("failed to export forecast to {}: {error}", path.display()),
        )
    })?;
    tracing::info!(path = %path.display(), "forecast exported");
    Ok(())
}

fn render_json_envelope(command: &str, result: Value) -> Result<String, CliError> {
    serde_json::to_string(&json!({
        "schema_version": ENVELOPE_SCHEMA_VERSION,
        "command": command,
        "ok": true,
        "result": result,
    }))
    .map_err(|error| {
        CliError::new(
            ErrorKind::Runtime,
            ERROR_CODE_RUNTIME_SERIALIZE,
            format!("failed to serialize output envelope: {error}"),
        )
    })
}

fn emit_error(command: &str, json_output: bool, error: &CliError) {
    if !json_output {
        eprintln!(
            "error[{}]: {}",
            error.code,
            redact_sensitive(&error.message)
        );
        return;
    }

    let payload = json!({
        "schema_version": ENVELOPE_SCHEMA_VERSION,
        "command": command,
        "ok": false,
        "error": {
            "code": error.code,
            "message": redact_sensitive(&error.message),
            "details": {
                "kind": error.kind.as_str(),
                "exit_code": error.exit_code(),
            }
        }
    });
    let rendered = serde_json::to_string(&payload).unwrap_or_else(|serialize_error| {
        format!(
            "{{\"schema_version\":\"{}\",\"command\":\"{}\",\"ok\":false,\"error\":{{\"code\":\"{}\",\"message\":\"{}\"}}}}",
            ENVELOPE_SCHEMA_VERSION,
            command,
            ERROR_CODE_RUNTIME_SERIALIZE,
            escape_json_string(&format!(
                "failed to serialize error envelope: {serialize_error}"
            )),
        )
    });
    println!("{rendered}");
}

fn user_invalid_input(error: ValidationError) -> CliError {
    CliError::new(
        ErrorKind::User,
        ERROR_CODE_USER_INVALID_INPUT,
        error.to_string(),
    )
}

fn map_app_error(error: AppError) -> CliError {
    let code = match error.kind {
        ErrorKind::User => ERROR_CODE_USER_INVALID_INPUT,
        ErrorKind::ConfigMissing => ERROR_CODE_CONFIG_MISSING,
        ErrorKind::ConfigCorrupted => ERROR_CODE_CONFIG_CORRUPTED,
        ErrorKind::Geocoding => ERROR_CODE_GEOCODING,
        ErrorKind::ForecastProvider => ERROR_CODE_FORECAST_PROVIDER,
        ErrorKind::DataIntegrity => ERROR_CODE_DATA_INTEGRITY,
        ErrorKind::Runtime => ERROR_CODE_RUNTIME_IO,
    };
    CliError::new(error.kind, code, error.message)
}

fn redact_sensitive(input: &str) -> String {
    let mut output = input.to_string();
    for pattern in [
        "access_key=",
        "access_key:",
        "token=",
        "token:",
        "secret=",
        "secret:",
        "authorization=",
        "authorization:",
    ] {
        output = redact_after_pattern(&output, pattern);
    }
    redact_bearer_token(&output)
}

fn redact_after_pattern(input: &str, pattern: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let is_authorization_pattern = pattern.starts_with("authorization");
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(found) = lower[cursor..].find(pattern) {
        let start = cursor + found;
        let value_start = skip_whitespace(input, start + pattern.len());
        let redaction_start = if is_authorization_pattern
            && lower[value_start..].starts_with("bearer ")
        {
            value_start + "bearer ".len()
        } else {
            value_start
        };
        let value_end = find_value_end(input, redaction_start);

        output.push_str(&input[cursor..redaction_start]);
        if redaction_start < value_end {
            output.push_str(REDACTED);
        }
        cursor = value_end;
    }

    output.push_str(&input[cursor..]);
    output
}

fn redact_bearer_token(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let pattern = "bearer ";
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(found) = lower[cursor..].find(pattern) {
        let value_start = cursor + found + pattern.len();
        let value_end = if input[value_start..].starts_with(REDACTED) {
            value_start
        } else {
            find_value_end(input, value_start)
        };

        output.push_str(&input[cursor..value_start]);
        if value_start < value_end {
            output.push_str(REDACTED);
        }
        cursor = value_end;
    }

    output.push_str(&input[cursor..]);
    output
}

fn skip_whitespace(input: &str, mut index: usize) -> usize {
    let bytes = input.as_bytes();
    while index < bytes.len() && bytes[index].is_ascii_whitespace() {
        index += 1;
    }
    index
}

fn find_value_end(input: &str, mut index: usize) -> usize {
    let bytes = input.as_bytes();
    while index < bytes.len() {
        let byte = bytes[index];
        if byte.is_ascii_whitespace() || matches!(byte, b'&' | b',' | b';' | b')' | b']' | b'}') {
            break;
        }
        index += 1;
    }
    index
}

fn escape_json_string(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c < '\u{20}' => escaped.push_str(&format!("\\u{:04x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}
