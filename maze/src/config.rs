use std::{fmt::Display, fs, path::Path, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    overlay::OverlayStyle,
    render::{Color, MazeStyle},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub overlay: OverlayStyle,
    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub cell_size: u32,
    pub background_color: Color,
    pub wall_color: Color,
    pub grid_line_color: Color,
    pub draw_grid_lines: bool,
}

/// Wire protocol spoken to the path service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// `graph.PathService/GetPath` over HTTP/2.
    #[default]
    Grpc,
    /// JSON `POST /path` gateway.
    Http,
}

impl Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Transport::Grpc => "grpc",
                Transport::Http => "http",
            }
        )
    }
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grpc" => Ok(Transport::Grpc),
            "http" => Ok(Transport::Http),
            _ => Err(ConfigError::InvalidTransport(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default)]
    pub transport: Transport,
    #[serde(default = "default_address")]
    pub address: String,
    /// No local timeout when absent.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

// Default values
fn default_cell_size() -> u32 {
    10
}
fn default_address() -> String {
    format!("http://{DEFAULT_HOST}:{DEFAULT_PORT}")
}

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9999;

impl Default for RenderConfig {
    fn default() -> Self {
        let style = MazeStyle::default();
        Self {
            cell_size: default_cell_size(),
            background_color: style.background_color,
            wall_color: style.wall_color,
            grid_line_color: style.grid_line_color,
            draw_grid_lines: style.draw_grid_lines,
        }
    }
}

impl RenderConfig {
    pub fn style(&self) -> MazeStyle {
        MazeStyle {
            background_color: self.background_color,
            wall_color: self.wall_color,
            grid_line_color: self.grid_line_color,
            draw_grid_lines: self.draw_grid_lines,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            address: default_address(),
            timeout_ms: None,
        }
    }
}

impl ServiceConfig {
    /// Replaces the address with `http://{host}:{port}`.
    pub fn set_host_port(&mut self, host: &str, port: u16) {
        self.address = format!("http://{host}:{port}");
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        fs::read_to_string(path)?.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.cell_size == 0 {
            return Err(ConfigError::CellSize(self.render.cell_size));
        }
        self.overlay.validate()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_empty_is_default() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.render.cell_size, 10);
        assert!(config.render.draw_grid_lines);
        assert_eq!(config.service.timeout(), None);
        assert_eq!(config.service.transport, Transport::Grpc);
        assert_eq!(config.service.address, "http://localhost:9999");
    }

    #[test]
    fn test_full() {
        let config: Config = r##"
            [render]
            cell_size = 4
            wall_color = "#000000"
            draw_grid_lines = false

            [overlay]
            path_color = "#00ff00"
            line_width = 3

            [service]
            transport = "http"
            address = "http://maze:8080"
            timeout_ms = 1500
        "##
        .parse()
        .unwrap();

        assert_eq!(config.render.cell_size, 4);
        assert_eq!(config.render.wall_color, Color::BLACK);
        assert_eq!(
            config.render.style().background_color,
            MazeStyle::default().background_color
        );
        assert!(!config.render.style().draw_grid_lines);
        assert_eq!(config.overlay.path_color, Color::rgb(0, 255, 0));
        assert_eq!(config.overlay.line_width, 3);
        assert_eq!(config.overlay.end_color, Color::RED);
        assert_eq!(config.service.transport, Transport::Http);
        assert_eq!(config.service.address, "http://maze:8080");
        assert_eq!(config.service.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_transport() {
        assert_eq!("gRPC".parse::<Transport>().unwrap(), Transport::Grpc);
        assert_eq!("http".parse::<Transport>().unwrap(), Transport::Http);
        assert!(matches!(
            "carrier pigeon".parse::<Transport>(),
            Err(ConfigError::InvalidTransport(_))
        ));
        assert!(matches!(
            "[service]\ntransport = \"smtp\"\n".parse::<Config>(),
            Err(ConfigError::Parse(_))
        ));

        let mut service = ServiceConfig::default();
        service.set_host_port("maze.local", 7000);
        assert_eq!(service.address, "http://maze.local:7000");
    }

    #[test]
    fn test_rejects_zero_cell_size() {
        assert!(matches!(
            "[render]\ncell_size = 0\n".parse::<Config>(),
            Err(ConfigError::CellSize(0))
        ));
    }

    #[test]
    fn test_rejects_zero_line_width() {
        assert!(matches!(
            "[overlay]\nline_width = 0\n".parse::<Config>(),
            Err(ConfigError::LineWidth(0))
        ));
    }

    #[test]
    fn test_rejects_bad_color() {
        assert!(matches!(
            "[render]\nwall_color = \"black\"\n".parse::<Config>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_shipped_config() {
        let config: Config = include_str!("../../maze.toml").parse().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_rejects_unknown_keys() {
        for source in [
            "[render]\ncel_size = 4\n",
            "[overlay]\nline_wdth = 3\n",
            "[service]\nadress = \"http://maze:8080\"\n",
            "[renderer]\ncell_size = 4\n",
        ] {
            assert!(
                matches!(source.parse::<Config>(), Err(ConfigError::Parse(_))),
                "{source}"
            );
        }
    }
}
