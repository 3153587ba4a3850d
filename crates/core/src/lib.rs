pub mod campaign;
pub mod candidate;
pub mod config;
pub mod continuation;
pub mod dispatcher;
pub mod filter;
pub mod gate;
pub mod inventory;
pub mod metrics;
pub mod scheduler;
pub mod source;
pub mod testing;

pub use campaign::{
    Campaign, CampaignEngine, CampaignStore, Category, CommitOutcome, CreateCampaignRequest,
    Eligibility, EngineError, EngineSettings, Mode, PolicyConfig, RetireReason, RoundOutcome,
    SessionState, SortStrategy, SqliteCampaignStore, StoreError,
};
pub use candidate::{Candidate, CandidateRecord, CandidateStore, Disposition, SqliteCandidateStore};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use continuation::{ContinuationConfig, ContinuationPolicy};
pub use dispatcher::{PoolDispatcher, PoolStatus, WorkDispatcher};
pub use filter::{FilterConfig, FilterReason, ResultFilter, Verdict};
pub use gate::{AlwaysOnline, AvailabilityGate, ConnectivityProbe, GateConfig, GateStatus, HttpProbe};
pub use inventory::{FsInventory, InventoryConfig, InventoryError, InventoryProbe};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerStatus, TickReport};
pub use source::{
    HttpJsonSource, QueryFilters, SourceAdapter, SourceConfig, SourceError, SourceQuery,
    SourceRouter,
};
