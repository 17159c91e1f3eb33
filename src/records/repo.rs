use std::{collections::HashMap, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tokio::sync::RwLock;

use super::Record;
use crate::{auth::repo_types::UserId, store::StoreResult};

/// Append-only history of one record kind, partitioned by owner.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Append `record` to the owner's history and return it as stored.
    /// Client-supplied ids are kept verbatim.
    async fn append(&self, owner: UserId, record: R) -> StoreResult<R>;

    /// The owner's full history in insertion order; empty when none.
    async fn list(&self, owner: UserId) -> StoreResult<Vec<R>>;
}

pub type SharedStore<R> = Arc<dyn RecordStore<R>>;

/// Rows live in `R::TABLE`; `seq` is a server-side counter that only
/// orders the history.
pub struct PgRecordStore<R> {
    db: PgPool,
    _kind: PhantomData<fn() -> R>,
}

impl<R> PgRecordStore<R> {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            _kind: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for PgRecordStore<R> {
    async fn append(&self, owner: UserId, record: R) -> StoreResult<R> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} (user_id, {}) ",
            R::TABLE,
            R::COLUMNS.join(", ")
        ));
        qb.push_values(std::iter::once(record.clone()), |mut row, r| {
            row.push_bind(owner);
            r.push_values(&mut row);
        });
        qb.build().execute(&self.db).await?;
        Ok(record)
    }

    async fn list(&self, owner: UserId) -> StoreResult<Vec<R>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1 ORDER BY seq ASC",
            R::COLUMNS.join(", "),
            R::TABLE
        );
        let rows = sqlx::query_as::<_, R>(&sql)
            .bind(owner)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }
}

/// Process-local store; one lock per kind serializes appends.
pub struct MemoryRecordStore<R> {
    records: RwLock<HashMap<UserId, Vec<R>>>,
}

impl<R> MemoryRecordStore<R> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<R> Default for MemoryRecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryRecordStore<R> {
    async fn append(&self, owner: UserId, record: R) -> StoreResult<R> {
        self.records
            .write()
            .await
            .entry(owner)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn list(&self, owner: UserId) -> StoreResult<Vec<R>> {
        Ok(self
            .records
            .read()
            .await
            .get(&owner)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Meal, Workout};

    fn workout(id: i64) -> Workout {
        Workout {
            id,
            workout_type: "run".into(),
            duration_minutes: 30,
            calories_burned: 250,
            date: "2025-08-06".into(),
        }
    }

    #[tokio::test]
    async fn empty_history_is_not_an_error() {
        let store = MemoryRecordStore::<Workout>::new();
        assert!(store.list(UserId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_extends_history_by_one() {
        let store = MemoryRecordStore::<Workout>::new();
        let owner = UserId::new();
        store.append(owner, workout(1)).await.unwrap();

        let before = store.list(owner).await.unwrap().len();
        let stored = store.append(owner, workout(2)).await.unwrap();
        let after = store.list(owner).await.unwrap();

        assert_eq!(after.len(), before + 1);
        assert_eq!(after.last(), Some(&stored));
        assert_eq!(after.iter().map(|w| w.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn histories_are_scoped_to_owner() {
        let store = MemoryRecordStore::<Workout>::new();
        let alice = UserId::new();
        let bob = UserId::new();
        store.append(alice, workout(1)).await.unwrap();

        assert_eq!(store.list(alice).await.unwrap().len(), 1);
        assert!(store.list(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_client_ids_are_kept() {
        let store = MemoryRecordStore::<Meal>::new();
        let owner = UserId::new();
        let meal = Meal {
            id: 7,
            meal_type: "Snack".into(),
            calories: 120,
            description: Some("apple".into()),
            date: "2025-08-06".into(),
        };
        store.append(owner, meal.clone()).await.unwrap();
        store.append(owner, meal.clone()).await.unwrap();
        assert_eq!(store.list(owner).await.unwrap(), vec![meal.clone(), meal]);
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let store = Arc::new(MemoryRecordStore::<Workout>::new());
        let owner = UserId::new();
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.append(owner, workout(i)).await.unwrap() })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.list(owner).await.unwrap().len(), 32);
    }

    mod pg {
        use super::*;
        use crate::auth::repo::{PgUserStore, UserStore};
        use crate::records::WeightEntry;

        async fn owner(pool: &PgPool, email: &str) -> UserId {
            PgUserStore::new(pool.clone())
                .insert(email, "hash")
                .await
                .unwrap()
                .id
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "requires DATABASE_URL"]
        async fn list_returns_insertion_order_with_duplicates(pool: PgPool) {
            let alice = owner(&pool, "alice@x.com").await;
            let store = PgRecordStore::<WeightEntry>::new(pool);

            let entries: Vec<_> = [(5, 71.0), (5, 70.5), (2, 70.1)]
                .into_iter()
                .map(|(id, weight_kg)| WeightEntry {
                    id,
                    weight_kg,
                    date: "2025-08-06".into(),
                })
                .collect();
            for e in &entries {
                let stored = store.append(alice, e.clone()).await.unwrap();
                assert_eq!(&stored, e);
            }

            assert_eq!(store.list(alice).await.unwrap(), entries);
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "requires DATABASE_URL"]
        async fn histories_are_scoped_to_owner_and_kind(pool: PgPool) {
            let alice = owner(&pool, "alice@x.com").await;
            let bob = owner(&pool, "bob@x.com").await;
            let workouts = PgRecordStore::<Workout>::new(pool.clone());
            let meals = PgRecordStore::<Meal>::new(pool);

            let meal = Meal {
                id: 1,
                meal_type: "Breakfast".into(),
                calories: 420,
                description: None,
                date: "2025-08-06".into(),
            };
            meals.append(alice, meal.clone()).await.unwrap();
            workouts.append(alice, workout(1)).await.unwrap();

            assert_eq!(meals.list(alice).await.unwrap(), vec![meal]);
            assert_eq!(workouts.list(alice).await.unwrap(), vec![workout(1)]);
            assert!(meals.list(bob).await.unwrap().is_empty());
            assert!(workouts.list(bob).await.unwrap().is_empty());
        }
    }
}
