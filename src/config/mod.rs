mod schema;

pub use schema::{
    Config, ExperimentSettings, GateSettings, ProviderSettings, ProvidersSettings,
    ScoringSettings,
};
