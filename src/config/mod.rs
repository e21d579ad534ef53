pub mod board;
pub mod settings;

pub use board::BoardConfig;
pub use settings::AppConfig;
