use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::debug;

use crate::{
    entities::{movie, user, user_movie},
    models::{Movie, NewMovie, User},
};

const USERNAME_MAX: usize = 80;
const MOVIE_TEXT_MAX: usize = 120;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    UserNotFound(i32),
    #[error("movie {0} not found")]
    MovieNotFound(i32),
    #[error("movie {movie_id} is not in the list of user {user_id}")]
    NotInList { user_id: i32, movie_id: i32 },
    #[error("movie {movie_id} is already in the list of user {user_id}")]
    AlreadyInList { user_id: i32, movie_id: i32 },
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),
    #[error("{0}")]
    Invalid(String),
    #[error("storage error: {0}")]
    Storage(#[from] DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Data access operations over users, movies and the lists linking them.
///
/// Every mutating operation is atomic: it either commits completely or leaves the store
/// exactly as it was.
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn find_user(&self, user_id: i32) -> StoreResult<Option<User>>;

    /// Movies in a user's list, oldest first. Empty when the user does not exist.
    async fn get_user_movies(&self, user_id: i32) -> StoreResult<Vec<Movie>>;

    async fn list_movies(&self) -> StoreResult<Vec<Movie>>;

    async fn find_movie(&self, movie_id: i32) -> StoreResult<Option<Movie>>;

    async fn add_user(&self, username: &str) -> StoreResult<User>;

    /// Creates a movie row and links it to `user_id`.
    async fn add_movie(&self, movie: NewMovie, user_id: i32) -> StoreResult<Movie>;

    /// Links an existing movie into a user's list.
    async fn link_movie(&self, user_id: i32, movie_id: i32) -> StoreResult<()>;

    /// Overwrites all four fields of the movie.
    async fn update_movie(&self, movie_id: i32, movie: NewMovie) -> StoreResult<()>;

    /// Deletes the movie row, taking it out of every user's list.
    async fn delete_movie(&self, movie_id: i32) -> StoreResult<()>;

    /// Deletes only the association; the movie row stays.
    async fn remove_movie_from_user(&self, user_id: i32, movie_id: i32) -> StoreResult<()>;
}

#[derive(Clone)]
pub struct SqliteStore {
    db: DatabaseConnection,
}

impl SqliteStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MovieStore for SqliteStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = user::Entity::find().order_by_asc(user::Column::Id).all(&self.db).await?;
        Ok(users.into_iter().map(User::from).collect())
    }

    async fn find_user(&self, user_id: i32) -> StoreResult<Option<User>> {
        Ok(user::Entity::find_by_id(user_id).one(&self.db).await?.map(User::from))
    }

    async fn get_user_movies(&self, user_id: i32) -> StoreResult<Vec<Movie>> {
        let Some(owner) = user::Entity::find_by_id(user_id).one(&self.db).await? else {
            return Ok(Vec::new());
        };

        let movies = owner
            .find_related(movie::Entity)
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await?;

        Ok(movies.into_iter().map(Movie::from).collect())
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let movies = movie::Entity::find().order_by_asc(movie::Column::Id).all(&self.db).await?;
        Ok(movies.into_iter().map(Movie::from).collect())
    }

    async fn find_movie(&self, movie_id: i32) -> StoreResult<Option<Movie>> {
        Ok(movie::Entity::find_by_id(movie_id).one(&self.db).await?.map(Movie::from))
    }

    async fn add_user(&self, username: &str) -> StoreResult<User> {
        let username = username.trim();
        validate_text("username", username, USERNAME_MAX)?;

        let txn = self.db.begin().await?;

        let taken = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }

        let model = user::ActiveModel { username: Set(username.to_string()), ..Default::default() }
            .insert(&txn)
            .await
            .map_err(|err| insert_user_error(err, username))?;

        txn.commit().await?;

        debug!(user_id = model.id, username = %model.username, "added user");
        Ok(model.into())
    }

    async fn add_movie(&self, movie: NewMovie, user_id: i32) -> StoreResult<Movie> {
        validate_movie(&movie)?;

        let txn = self.db.begin().await?;

        if user::Entity::find_by_id(user_id).one(&txn).await?.is_none() {
            return Err(StoreError::UserNotFound(user_id));
        }

        let model = movie::ActiveModel {
            title: Set(movie.title),
            director: Set(movie.director),
            year: Set(movie.year),
            rating: Set(movie.rating),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        user_movie::Entity::insert(user_movie::ActiveModel {
            user_id: Set(user_id),
            movie_id: Set(model.id),
        })
        .exec_without_returning(&txn)
        .await?;

        txn.commit().await?;

        debug!(user_id = user_id, movie_id = model.id, title = %model.title, "added movie");
        Ok(model.into())
    }

    async fn link_movie(&self, user_id: i32, movie_id: i32) -> StoreResult<()> {
        let txn = self.db.begin().await?;

        ensure_both_exist(&txn, user_id, movie_id).await?;

        let linked = user_movie::Entity::find_by_id((user_id, movie_id)).one(&txn).await?;
        if linked.is_some() {
            return Err(StoreError::AlreadyInList { user_id, movie_id });
        }

        user_movie::Entity::insert(user_movie::ActiveModel {
            user_id: Set(user_id),
            movie_id: Set(movie_id),
        })
        .exec_without_returning(&txn)
        .await?;

        txn.commit().await?;

        debug!(user_id = user_id, movie_id = movie_id, "linked movie");
        Ok(())
    }

    async fn update_movie(&self, movie_id: i32, movie: NewMovie) -> StoreResult<()> {
        validate_movie(&movie)?;

        let txn = self.db.begin().await?;

        let Some(existing) = movie::Entity::find_by_id(movie_id).one(&txn).await? else {
            return Err(StoreError::MovieNotFound(movie_id));
        };

        let mut active: movie::ActiveModel = existing.into();
        active.title = Set(movie.title);
        active.director = Set(movie.director);
        active.year = Set(movie.year);
        active.rating = Set(movie.rating);
        active.update(&txn).await?;

        txn.commit().await?;

        debug!(movie_id = movie_id, "updated movie");
        Ok(())
    }

    async fn delete_movie(&self, movie_id: i32) -> StoreResult<()> {
        let txn = self.db.begin().await?;

        if movie::Entity::find_by_id(movie_id).one(&txn).await?.is_none() {
            return Err(StoreError::MovieNotFound(movie_id));
        }

        let unlinked = user_movie::Entity::delete_many()
            .filter(user_movie::Column::MovieId.eq(movie_id))
            .exec(&txn)
            .await?;
        movie::Entity::delete_by_id(movie_id).exec(&txn).await?;

        txn.commit().await?;

        debug!(movie_id = movie_id, lists = unlinked.rows_affected, "deleted movie");
        Ok(())
    }

    async fn remove_movie_from_user(&self, user_id: i32, movie_id: i32) -> StoreResult<()> {
        let txn = self.db.begin().await?;

        ensure_both_exist(&txn, user_id, movie_id).await?;

        let removed = user_movie::Entity::delete_many()
            .filter(user_movie::Column::UserId.eq(user_id))
            .filter(user_movie::Column::MovieId.eq(movie_id))
            .exec(&txn)
            .await?;
        if removed.rows_affected == 0 {
            return Err(StoreError::NotInList { user_id, movie_id });
        }

        txn.commit().await?;

        debug!(user_id = user_id, movie_id = movie_id, "removed movie from list");
        Ok(())
    }
}

async fn ensure_both_exist<C: sea_orm::ConnectionTrait>(
    conn: &C,
    user_id: i32,
    movie_id: i32,
) -> StoreResult<()> {
    if user::Entity::find_by_id(user_id).one(conn).await?.is_none() {
        return Err(StoreError::UserNotFound(user_id));
    }
    if movie::Entity::find_by_id(movie_id).one(conn).await?.is_none() {
        return Err(StoreError::MovieNotFound(movie_id));
    }
    Ok(())
}

// A concurrent writer can claim the name between the pre-check and the insert.
fn insert_user_error(err: DbErr, username: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::DuplicateUsername(username.to_string())
        },
        _ => StoreError::Storage(err),
    }
}

fn validate_movie(movie: &NewMovie) -> StoreResult<()> {
    validate_text("title", &movie.title, MOVIE_TEXT_MAX)?;
    validate_text("director", &movie.director, MOVIE_TEXT_MAX)?;
    if !movie.rating.is_finite() {
        return Err(StoreError::Invalid("rating must be a number".to_string()));
    }
    Ok(())
}

fn validate_text(field: &str, value: &str, max: usize) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Invalid(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(StoreError::Invalid(format!("{field} must be at most {max} characters")));
    }
    Ok(())
}
