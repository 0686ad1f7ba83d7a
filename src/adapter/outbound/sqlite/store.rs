//! SQLite topology store.
//!
//! Durable record of desired pool membership: one identity row per
//! (device, partition, pool, nodename) and one property row (port, status)
//! owned by it. Every public write is its own short transaction.

use std::collections::BTreeSet;
use std::fmt;

use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::Sqlite;
use diesel::SqliteConnection;
use tracing::debug;

use super::database::connection::DbPool;
use super::database::model::{NewPoolmemberRow, NewPropertyRow, PoolmemberRow, PropertyRow};
use super::database::schema::{poolmember_properties, poolmembers};
use crate::error::{Error, Result};

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Identity column of the poolmembers table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Device,
    Partition,
    Pool,
    Nodename,
}

/// Equality filter over the identity columns. Unset columns match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberFilter<'a> {
    pub device: Option<&'a str>,
    pub partition: Option<&'a str>,
    pub pool: Option<&'a str>,
    pub nodename: Option<&'a str>,
}

impl<'a> MemberFilter<'a> {
    #[must_use]
    pub fn device(mut self, device: &'a str) -> Self {
        self.device = Some(device);
        self
    }

    #[must_use]
    pub fn partition(mut self, partition: &'a str) -> Self {
        self.partition = Some(partition);
        self
    }

    #[must_use]
    pub fn pool(mut self, pool: &'a str) -> Self {
        self.pool = Some(pool);
        self
    }

    #[must_use]
    pub fn nodename(mut self, nodename: &'a str) -> Self {
        self.nodename = Some(nodename);
        self
    }

    fn query(self) -> poolmembers::BoxedQuery<'a, Sqlite> {
        let mut query = poolmembers::table.into_boxed();
        if let Some(device) = self.device {
            query = query.filter(poolmembers::device.eq(device));
        }
        if let Some(partition) = self.partition {
            query = query.filter(poolmembers::partition.eq(partition));
        }
        if let Some(pool) = self.pool {
            query = query.filter(poolmembers::pool.eq(pool));
        }
        if let Some(nodename) = self.nodename {
            query = query.filter(poolmembers::nodename.eq(nodename));
        }
        query
    }
}

/// Full identity of one pool member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberKey<'a> {
    pub device: &'a str,
    pub partition: &'a str,
    pub pool: &'a str,
    pub nodename: &'a str,
}

impl<'a> MemberKey<'a> {
    fn filter(self) -> MemberFilter<'a> {
        MemberFilter::default()
            .device(self.device)
            .partition(self.partition)
            .pool(self.pool)
            .nodename(self.nodename)
    }
}

impl fmt::Display for MemberKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.device, self.partition, self.pool, self.nodename
        )
    }
}

/// Map a unique-constraint violation to `AlreadyExists`, anything else to a
/// generic store failure.
fn classify(err: DieselError, what: impl FnOnce() -> String) -> Error {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            Error::AlreadyExists(what())
        }
        other => Error::Database(other.to_string()),
    }
}

/// SQLite-backed store for pool membership.
#[derive(Clone)]
pub struct TopologyStore {
    /// Database connection pool.
    pool: DbPool,
}

impl TopologyStore {
    /// Create a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<Conn> {
        self.pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))
    }

    /// Distinct values of one identity column among rows matching `filter`.
    pub fn distinct(&self, field: Field, filter: MemberFilter<'_>) -> Result<BTreeSet<String>> {
        let mut conn = self.conn()?;
        let query = filter.query();
        let values = match field {
            Field::Device => query
                .select(poolmembers::device)
                .distinct()
                .load::<String>(&mut conn),
            Field::Partition => query
                .select(poolmembers::partition)
                .distinct()
                .load::<String>(&mut conn),
            Field::Pool => query
                .select(poolmembers::pool)
                .distinct()
                .load::<String>(&mut conn),
            Field::Nodename => query
                .select(poolmembers::nodename)
                .distinct()
                .load::<String>(&mut conn),
        }?;
        Ok(values.into_iter().collect())
    }

    /// Whether at least one row matches `filter`.
    pub fn any(&self, filter: MemberFilter<'_>) -> Result<bool> {
        let mut conn = self.conn()?;
        let found: Option<i32> = filter
            .query()
            .select(poolmembers::id)
            .first(&mut conn)
            .optional()?;
        Ok(found.is_some())
    }

    /// Identity row for `key`, if present.
    pub fn find_member(&self, key: &MemberKey<'_>) -> Result<Option<PoolmemberRow>> {
        let mut conn = self.conn()?;
        Self::find_member_with(&mut conn, key)
    }

    fn find_member_with(
        conn: &mut SqliteConnection,
        key: &MemberKey<'_>,
    ) -> Result<Option<PoolmemberRow>> {
        Ok(key
            .filter()
            .query()
            .select(PoolmemberRow::as_select())
            .first(conn)
            .optional()?)
    }

    /// Property row owned by a pool member, if present.
    pub fn property(&self, member_id: i32) -> Result<Option<PropertyRow>> {
        let mut conn = self.conn()?;
        Ok(poolmember_properties::table
            .filter(poolmember_properties::poolmember_id.eq(member_id))
            .select(PropertyRow::as_select())
            .first(&mut conn)
            .optional()?)
    }

    /// Insert the identity row and its property row as one write.
    ///
    /// Each insert's uniqueness violation surfaces as `AlreadyExists` naming
    /// the row kind; any failure leaves neither row behind.
    pub fn insert_member(
        &self,
        key: &MemberKey<'_>,
        port: u16,
        status: bool,
    ) -> Result<PoolmemberRow> {
        let mut conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        let row = conn.transaction::<PoolmemberRow, Error, _>(|conn| {
            diesel::insert_into(poolmembers::table)
                .values(&NewPoolmemberRow {
                    device: key.device,
                    partition: key.partition,
                    pool: key.pool,
                    nodename: key.nodename,
                    created_at: now.clone(),
                })
                .execute(conn)
                .map_err(|e| classify(e, || format!("poolmember {key}")))?;

            let row = Self::find_member_with(conn, key)?.ok_or_else(|| {
                Error::Database(format!("poolmember {key} vanished after insert"))
            })?;

            diesel::insert_into(poolmember_properties::table)
                .values(&NewPropertyRow {
                    poolmember_id: row.id,
                    port: i32::from(port),
                    status,
                    created_at: now.clone(),
                })
                .execute(conn)
                .map_err(|e| classify(e, || format!("poolmember properties {key}")))?;

            Ok(row)
        })?;

        debug!(member = %key, port, status, "Poolmember row created");
        Ok(row)
    }

    /// Delete every identity row matching `filter`; property rows cascade.
    pub fn delete_members(&self, filter: MemberFilter<'_>) -> Result<usize> {
        let mut conn = self.conn()?;
        let deleted = conn.transaction::<usize, DieselError, _>(|conn| {
            let ids: Vec<i32> = filter.query().select(poolmembers::id).load(conn)?;
            diesel::delete(poolmembers::table.filter(poolmembers::id.eq_any(ids))).execute(conn)
        })?;
        Ok(deleted)
    }

    /// Write the enabled status of a pool member. Returns rows updated.
    pub fn set_status(&self, member_id: i32, status: bool) -> Result<usize> {
        let mut conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let updated = conn.transaction::<usize, DieselError, _>(|conn| {
            diesel::update(
                poolmember_properties::table
                    .filter(poolmember_properties::poolmember_id.eq(member_id)),
            )
            .set((
                poolmember_properties::status.eq(status),
                poolmember_properties::updated_at.eq(Some(now.clone())),
            ))
            .execute(conn)
        })?;
        Ok(updated)
    }

    /// Number of property rows; used to observe cascades.
    pub fn property_count(&self) -> Result<i64> {
        let mut conn = self.conn()?;
        Ok(poolmember_properties::table.count().get_result(&mut conn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};

    fn setup_test_db() -> TopologyStore {
        let pool = create_pool(":memory:").expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        TopologyStore::new(pool)
    }

    fn key<'a>(device: &'a str, pool: &'a str, nodename: &'a str) -> MemberKey<'a> {
        MemberKey {
            device,
            partition: "/P",
            pool,
            nodename,
        }
    }

    // -------------------------------------------------------------------------
    // Inserts
    // -------------------------------------------------------------------------

    #[test]
    fn insert_writes_identity_and_property() {
        let store = setup_test_db();
        let row = store.insert_member(&key("lb1", "/P/web", "/P/n1"), 80, true).unwrap();

        let found = store.find_member(&key("lb1", "/P/web", "/P/n1")).unwrap().unwrap();
        assert_eq!(found, row);

        let property = store.property(row.id).unwrap().unwrap();
        assert_eq!(property.port, 80);
        assert!(property.status);
    }

    #[test]
    fn duplicate_insert_is_already_exists_and_keeps_original() {
        let store = setup_test_db();
        let first = store.insert_member(&key("lb1", "/P/web", "/P/n1"), 80, true).unwrap();

        let err = store
            .insert_member(&key("lb1", "/P/web", "/P/n1"), 443, false)
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(ref msg) if msg.starts_with("poolmember lb1")));

        let property = store.property(first.id).unwrap().unwrap();
        assert_eq!(property.port, 80);
        assert!(property.status);
        assert_eq!(store.property_count().unwrap(), 1);
    }

    #[test]
    fn property_conflict_is_already_exists_and_rolls_back_identity() {
        let store = setup_test_db();
        {
            // Leave a property row waiting for the id the next identity row gets.
            let mut conn = store.conn().unwrap();
            diesel::sql_query("PRAGMA foreign_keys = OFF").execute(&mut conn).unwrap();
            diesel::insert_into(poolmember_properties::table)
                .values(&NewPropertyRow {
                    poolmember_id: 1,
                    port: 80,
                    status: true,
                    created_at: Utc::now().to_rfc3339(),
                })
                .execute(&mut conn)
                .unwrap();
            diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut conn).unwrap();
        }

        let err = store
            .insert_member(&key("lb1", "/P/web", "/P/n1"), 80, true)
            .unwrap_err();

        assert!(
            matches!(err, Error::AlreadyExists(ref msg) if msg.starts_with("poolmember properties lb1")),
            "{err:?}"
        );
        assert!(store.find_member(&key("lb1", "/P/web", "/P/n1")).unwrap().is_none());
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[test]
    fn distinct_eliminates_duplicates() {
        let store = setup_test_db();
        store.insert_member(&key("lb1", "/P/web", "/P/n1"), 80, true).unwrap();
        store.insert_member(&key("lb1", "/P/api", "/P/n1"), 80, true).unwrap();
        store.insert_member(&key("lb2", "/P/web", "/P/n2"), 80, true).unwrap();

        let nodes = store
            .distinct(Field::Nodename, MemberFilter::default().device("lb1"))
            .unwrap();
        assert_eq!(nodes.into_iter().collect::<Vec<_>>(), vec!["/P/n1"]);

        let pools = store
            .distinct(Field::Pool, MemberFilter::default().device("lb1"))
            .unwrap();
        assert_eq!(pools.len(), 2);

        let devices = store
            .distinct(Field::Device, MemberFilter::default().pool("/P/web"))
            .unwrap();
        assert_eq!(devices.into_iter().collect::<Vec<_>>(), vec!["lb1", "lb2"]);

        let partitions = store.distinct(Field::Partition, MemberFilter::default()).unwrap();
        assert_eq!(partitions.len(), 1);
    }

    #[test]
    fn any_respects_every_filter_column() {
        let store = setup_test_db();
        store.insert_member(&key("lb1", "/P/web", "/P/n1"), 80, true).unwrap();

        assert!(store.any(MemberFilter::default().device("lb1")).unwrap());
        assert!(store
            .any(MemberFilter::default().device("lb1").pool("/P/web").nodename("/P/n1"))
            .unwrap());
        assert!(!store.any(MemberFilter::default().device("lb2")).unwrap());
        assert!(!store
            .any(MemberFilter::default().device("lb1").partition("/Q"))
            .unwrap());
    }

    // -------------------------------------------------------------------------
    // Deletes and updates
    // -------------------------------------------------------------------------

    #[test]
    fn delete_cascades_to_properties() {
        let store = setup_test_db();
        store.insert_member(&key("lb1", "/P/web", "/P/n1"), 80, true).unwrap();
        store.insert_member(&key("lb1", "/P/web", "/P/n2"), 80, true).unwrap();
        store.insert_member(&key("lb1", "/P/api", "/P/n1"), 80, true).unwrap();

        let deleted = store
            .delete_members(MemberFilter::default().device("lb1").pool("/P/web"))
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.property_count().unwrap(), 1);
        assert!(store.find_member(&key("lb1", "/P/api", "/P/n1")).unwrap().is_some());
    }

    #[test]
    fn delete_with_no_match_is_zero() {
        let store = setup_test_db();
        assert_eq!(
            store.delete_members(MemberFilter::default().device("ghost")).unwrap(),
            0
        );
    }

    #[test]
    fn set_status_updates_property() {
        let store = setup_test_db();
        let row = store.insert_member(&key("lb1", "/P/web", "/P/n1"), 80, true).unwrap();

        assert_eq!(store.set_status(row.id, false).unwrap(), 1);
        let property = store.property(row.id).unwrap().unwrap();
        assert!(!property.status);
        assert!(property.updated_at.is_some());
    }

    #[test]
    fn set_status_without_property_row_updates_nothing() {
        let store = setup_test_db();
        assert_eq!(store.set_status(42, true).unwrap(), 0);
    }

    #[test]
    fn member_key_display_is_slash_joined() {
        assert_eq!(key("lb1", "/P/web", "/P/n1").to_string(), "lb1//P//P/web//P/n1");
    }
}
