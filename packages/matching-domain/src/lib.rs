pub mod attributes;
pub mod matching;
pub mod notification;
pub mod patch;
pub mod profile;
pub mod time_serde;

mod error;

pub use attributes::{Age, Category, Level, MostActiveTime, ParameterCode, ProfileStatus};
pub use error::{Error, Result};
pub use matching::{Candidate, MemberSignal, QueryProjection, SignalLookup};
pub use notification::{NotificationRequest, NotificationType};
pub use patch::Patch;
pub use profile::{NewProfile, Profile, ProfileDraft, ProfileRecord, ProfileUpdate};
