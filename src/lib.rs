pub mod logging;

pub mod clock;
pub mod config;
pub mod content_index;
pub mod errors;
pub mod exam_dates;
pub mod fingerprint;
pub mod models;
pub mod persistence;
pub mod quiz_source;
pub mod reconciler;
pub mod review_store;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod shuffler;
pub mod validator;

pub use clock::{Clock, DayRollover, FixedClock, SystemClock};
pub use config::Config;
pub use content_index::ContentIndex;
pub use errors::*;
pub use exam_dates::ExamDates;
pub use fingerprint::fingerprint_question;
pub use models::*;
pub use quiz_source::DirectorySource;
pub use reconciler::{ReconcileReport, Reconciliation, reconcile};
pub use review_store::ReviewStore;
pub use scheduler::Sm2Scheduler;
pub use session::{Console, Interaction, SessionEngine, SessionSummary, StdConsole};
pub use shuffler::{Presentation, ReferenceRemapper, ShuffleMapping, Shuffler};
pub use validator::validate;
