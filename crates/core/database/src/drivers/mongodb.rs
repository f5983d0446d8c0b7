use std::sync::Arc;

use futures::lock::Mutex;
use futures::StreamExt;
use mongodb::bson::Document;
use mongodb::error::Result;
use mongodb::options::FindOptions;
use mongodb::results::{DeleteResult, InsertOneResult, UpdateResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

database_derived!(
    /// MongoDB implementation
    pub struct MongoDb {
        client: ::mongodb::Client,
        database_name: String,

        /// Serializes duplicate-location check + insert within this
        /// process; the storage layer itself offers no advisory lock
        /// over a geodesic radius. Deployments running more than one
        /// API process must put a shared lock in front of inserts.
        pub(crate) insert_lock: Arc<Mutex<()>>,
    }
);

impl MongoDb {
    pub fn new(client: ::mongodb::Client, database_name: String) -> Self {
        MongoDb {
            client,
            database_name,
            insert_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the Floodnet database
    pub fn db(&self) -> mongodb::Database {
        self.client.database(&self.database_name)
    }

    /// Get a collection by its name
    pub fn col<T: Send + Sync>(&self, collection: &str) -> mongodb::Collection<T> {
        self.db().collection(collection)
    }

    /// Prepare collection indexes
    pub async fn migrate_database(&self) -> std::result::Result<(), ()> {
        info!("Running database migrations.");

        self.col::<Document>("reports")
            .create_index(
                mongodb::IndexModel::builder()
                    .keys(doc! {
                        "latitude": 1_i32,
                        "longitude": 1_i32,
                    })
                    .build(),
            )
            .await
            .map_err(|_| ())?;

        self.col::<Document>("reports")
            .create_index(
                mongodb::IndexModel::builder()
                    .keys(doc! {
                        "status": 1_i32,
                        "created_at": -1_i32,
                    })
                    .build(),
            )
            .await
            .map_err(|_| ())?;

        Ok(())
    }

    /// Insert one document into a collection
    pub async fn insert_one<T: Serialize + Send + Sync>(
        &self,
        collection: &'static str,
        document: T,
    ) -> Result<InsertOneResult> {
        self.col::<T>(collection).insert_one(document).await
    }

    /// Find multiple documents in a collection with options
    pub async fn find_with_options<O, T: DeserializeOwned + Unpin + Send + Sync>(
        &self,
        collection: &'static str,
        projection: Document,
        options: O,
    ) -> Result<Vec<T>>
    where
        O: Into<Option<FindOptions>>,
    {
        Ok(self
            .col::<T>(collection)
            .find(projection)
            .with_options(options)
            .await?
            .filter_map(|s| async {
                if cfg!(debug_assertions) {
                    // Hard fail on invalid documents
                    Some(s.unwrap())
                } else {
                    s.ok()
                }
            })
            .collect::<Vec<T>>()
            .await)
    }

    /// Find multiple documents in a collection
    pub async fn find<T: DeserializeOwned + Unpin + Send + Sync>(
        &self,
        collection: &'static str,
        projection: Document,
    ) -> Result<Vec<T>> {
        self.find_with_options(collection, projection, None).await
    }

    /// Find one document
    pub async fn find_one<T: DeserializeOwned + Unpin + Send + Sync>(
        &self,
        collection: &'static str,
        projection: Document,
    ) -> Result<Option<T>> {
        self.col::<T>(collection).find_one(projection).await
    }

    /// Find one document by its ID
    pub async fn find_one_by_id<T: DeserializeOwned + Unpin + Send + Sync>(
        &self,
        collection: &'static str,
        id: &str,
    ) -> Result<Option<T>> {
        self.find_one(
            collection,
            doc! {
                "_id": id
            },
        )
        .await
    }

    /// Apply a raw update to one document by its ID
    pub async fn update_one_by_id(
        &self,
        collection: &'static str,
        id: &str,
        update: Document,
    ) -> Result<UpdateResult> {
        self.col::<Document>(collection)
            .update_one(
                doc! {
                    "_id": id
                },
                update,
            )
            .await
    }

    /// Delete one document by the given projection
    pub async fn delete_one(
        &self,
        collection: &'static str,
        projection: Document,
    ) -> Result<DeleteResult> {
        self.col::<Document>(collection).delete_one(projection).await
    }

    /// Delete one document by its ID
    pub async fn delete_one_by_id(
        &self,
        collection: &'static str,
        id: &str,
    ) -> Result<DeleteResult> {
        self.delete_one(
            collection,
            doc! {
                "_id": id
            },
        )
        .await
    }
}
