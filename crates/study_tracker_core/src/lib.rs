pub mod accounts;
pub mod domain;
pub mod ports;
pub mod streak;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use accounts::{Accounts, AuthOutcome};
pub use domain::{
    Category, CategoryBreakdown, DailyActivity, Identity, IssuedToken, Language, LanguageStats,
    LanguageSummary, NewStudySession, NewUser, OverallStats, SessionChanges, SessionWithLanguage,
    StudySession, TopLanguage, User, UserCredentials,
};
pub use ports::{DatabaseService, FieldError, PasswordService, PortError, PortResult, TokenService};
