mod reports;

pub use reports::*;

use crate::Database;
#[cfg(feature = "mongodb")]
use crate::MongoDb;
use crate::ReferenceDb;

pub trait AbstractDatabase: Sync + Send + reports::AbstractReports {}

impl AbstractDatabase for ReferenceDb {}
#[cfg(feature = "mongodb")]
impl AbstractDatabase for MongoDb {}

impl std::ops::Deref for Database {
    type Target = dyn AbstractDatabase;

    fn deref(&self) -> &Self::Target {
        match &self {
            Database::Reference(dummy) => dummy,
            #[cfg(feature = "mongodb")]
            Database::MongoDb(mongo) => mongo,
        }
    }
}
