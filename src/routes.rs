use axum::{
    Router,
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::SignedCookieJar;
use tracing::warn;

use crate::{
    AppState,
    error::AppResult,
    flash::{self, Flash, Outcome},
    models::{AddUserForm, LinkForm, LookupForm, ManualQuery, Movie, MovieForm, User},
    omdb::Lookup,
    store::StoreError,
    templates,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/users", get(list_users))
        .route("/add_user", get(add_user_form).post(add_user))
        .route("/users/{user_id}", get(user_movies))
        .route("/users/{user_id}/add_movie", get(add_movie_form).post(add_movie))
        .route(
            "/users/{user_id}/add_movie_manual",
            get(add_movie_manual_form).post(add_movie_manual),
        )
        .route(
            "/users/{user_id}/update_movie/{movie_id}",
            get(update_movie_form).post(update_movie),
        )
        .route("/users/{user_id}/delete_movie/{movie_id}", get(remove_movie))
        .route("/users/{user_id}/link_movie", post(link_movie))
        .route("/movies/{movie_id}/delete", post(delete_movie))
        .fallback(not_found)
        .with_state(state)
}

pub async fn list_users(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> AppResult<(SignedCookieJar, Html<String>)> {
    let users = state.store.list_users().await?;
    let (jar, flash) = flash::take(jar);
    Ok((jar, Html(templates::users_page(&users, flash.as_ref()))))
}

pub async fn add_user_form(jar: SignedCookieJar) -> (SignedCookieJar, Html<String>) {
    let (jar, flash) = flash::take(jar);
    (jar, Html(templates::add_user_page(flash.as_ref())))
}

pub async fn add_user(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<AddUserForm>,
) -> impl IntoResponse {
    let outcome = match state.store.add_user(form.username.trim()).await {
        Ok(user) => Outcome::new(
            "/users",
            Flash::success(format!("User {} has been successfully added!", user.username)),
        ),
        Err(err) => Outcome::new("/add_user", failure(err, None, None)),
    };
    outcome.into_response_parts(jar)
}

pub async fn user_movies(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    jar: SignedCookieJar,
) -> AppResult<Response> {
    let Some(user) = state.store.find_user(user_id).await? else {
        return Ok(not_found().await.into_response());
    };

    let movies = state.store.get_user_movies(user_id).await?;
    let others: Vec<Movie> = state
        .store
        .list_movies()
        .await?
        .into_iter()
        .filter(|m| !movies.iter().any(|own| own.id == m.id))
        .collect();

    let (jar, flash) = flash::take(jar);
    let page = templates::user_movies_page(&user, &movies, &others, flash.as_ref());
    Ok((jar, Html(page)).into_response())
}

pub async fn add_movie_form(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    jar: SignedCookieJar,
) -> AppResult<Response> {
    let user = match require_user(&state, user_id).await? {
        Ok(user) => user,
        Err(outcome) => return Ok(outcome.into_response_parts(jar).into_response()),
    };
    let (jar, flash) = flash::take(jar);
    Ok((jar, Html(templates::add_movie_page(&user, flash.as_ref()))).into_response())
}

pub async fn add_movie(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    jar: SignedCookieJar,
    Form(form): Form<LookupForm>,
) -> AppResult<impl IntoResponse> {
    let user = match require_user(&state, user_id).await? {
        Ok(user) => user,
        Err(outcome) => return Ok(outcome.into_response_parts(jar)),
    };

    let back = format!("/users/{}/add_movie", user.id);
    let title = form.movie.trim();
    if title.is_empty() {
        let flash = Flash::error("Please enter a movie title.");
        return Ok(Outcome::new(back, flash).into_response_parts(jar));
    }
    let year_text = form.year.trim();
    let year = if year_text.is_empty() {
        None
    } else {
        match year_text.parse::<i32>() {
            Ok(year) => Some(year),
            Err(_) => {
                let flash = Flash::error(format!("'{year_text}' is not a valid year"));
                return Ok(Outcome::new(back, flash).into_response_parts(jar));
            },
        }
    };

    let outcome = match state.omdb.lookup(title, year).await {
        Lookup::Found(details) => match state.store.add_movie(details.into(), user.id).await {
            Ok(_) => Outcome::new(
                format!("/users/{}", user.id),
                Flash::success("Movie successfully added with OMDb data!"),
            ),
            Err(err) => {
                Outcome::new(format!("/users/{}", user.id), failure(err, Some(user.id), None))
            },
        },
        Lookup::NotFound => Outcome::new(
            format!(
                "/users/{}/add_movie_manual?movie={}&year={}",
                user.id,
                urlencoding::encode(title),
                urlencoding::encode(year_text)
            ),
            Flash::info("Movie not found in OMDb. Please enter the details manually."),
        ),
    };
    Ok(outcome.into_response_parts(jar))
}

pub async fn add_movie_manual_form(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Query(prefill): Query<ManualQuery>,
    jar: SignedCookieJar,
) -> AppResult<Response> {
    let user = match require_user(&state, user_id).await? {
        Ok(user) => user,
        Err(outcome) => return Ok(outcome.into_response_parts(jar).into_response()),
    };
    let (jar, flash) = flash::take(jar);
    let page = templates::add_movie_manual_page(&user, &prefill, flash.as_ref());
    Ok((jar, Html(page)).into_response())
}

pub async fn add_movie_manual(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    jar: SignedCookieJar,
    Form(form): Form<MovieForm>,
) -> impl IntoResponse {
    let list = format!("/users/{user_id}");
    let outcome = match form.parse() {
        Ok(movie) => match state.store.add_movie(movie, user_id).await {
            Ok(_) => {
                Outcome::new(list, Flash::success("Movie successfully added with manual data!"))
            },
            Err(err) => Outcome::new(list, failure(err, Some(user_id), None)),
        },
        Err(reason) => Outcome::new(
            format!(
                "/users/{user_id}/add_movie_manual?movie={}&year={}",
                urlencoding::encode(form.movie.trim()),
                urlencoding::encode(form.year.trim())
            ),
            Flash::error(reason),
        ),
    };
    outcome.into_response_parts(jar)
}

pub async fn update_movie_form(
    State(state): State<AppState>,
    Path((user_id, movie_id)): Path<(i32, i32)>,
    jar: SignedCookieJar,
) -> AppResult<Response> {
    let (user, movie) = match require_listed_movie(&state, user_id, movie_id).await? {
        Ok(found) => found,
        Err(outcome) => return Ok(outcome.into_response_parts(jar).into_response()),
    };
    let (jar, flash) = flash::take(jar);
    let page = templates::update_movie_page(&user, &movie, flash.as_ref());
    Ok((jar, Html(page)).into_response())
}

pub async fn update_movie(
    State(state): State<AppState>,
    Path((user_id, movie_id)): Path<(i32, i32)>,
    jar: SignedCookieJar,
    Form(form): Form<MovieForm>,
) -> AppResult<impl IntoResponse> {
    let (user, movie) = match require_listed_movie(&state, user_id, movie_id).await? {
        Ok(found) => found,
        Err(outcome) => return Ok(outcome.into_response_parts(jar)),
    };

    let list = format!("/users/{}", user.id);
    let outcome = match form.parse() {
        Ok(fields) => match state.store.update_movie(movie.id, fields).await {
            Ok(()) => Outcome::new(list, Flash::success("Movie successfully updated!")),
            Err(err) => Outcome::new(list, failure(err, Some(user.id), Some(movie.id))),
        },
        Err(reason) => Outcome::new(
            format!("/users/{}/update_movie/{}", user.id, movie.id),
            Flash::error(reason),
        ),
    };
    Ok(outcome.into_response_parts(jar))
}

pub async fn remove_movie(
    State(state): State<AppState>,
    Path((user_id, movie_id)): Path<(i32, i32)>,
    jar: SignedCookieJar,
) -> impl IntoResponse {
    let flash = match state.store.remove_movie_from_user(user_id, movie_id).await {
        Ok(()) => Flash::success("Movie successfully removed from your list!"),
        Err(err) => failure(err, Some(user_id), Some(movie_id)),
    };
    Outcome::new(format!("/users/{user_id}"), flash).into_response_parts(jar)
}

pub async fn link_movie(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    jar: SignedCookieJar,
    Form(form): Form<LinkForm>,
) -> impl IntoResponse {
    let flash = match state.store.link_movie(user_id, form.movie_id).await {
        Ok(()) => Flash::success("Movie successfully added to your list!"),
        Err(err) => failure(err, Some(user_id), Some(form.movie_id)),
    };
    Outcome::new(format!("/users/{user_id}"), flash).into_response_parts(jar)
}

pub async fn delete_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
    jar: SignedCookieJar,
) -> impl IntoResponse {
    let flash = match state.store.delete_movie(movie_id).await {
        Ok(()) => Flash::success("Movie deleted from every list."),
        Err(err) => failure(err, None, Some(movie_id)),
    };
    Outcome::new("/users", flash).into_response_parts(jar)
}

pub async fn not_found() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(templates::not_found_page()))
}

async fn require_user(state: &AppState, user_id: i32) -> AppResult<Result<User, Outcome>> {
    Ok(state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| Outcome::new("/users", Flash::error("User not found."))))
}

/// Resolves a movie only when it is in the given user's list.
async fn require_listed_movie(
    state: &AppState,
    user_id: i32,
    movie_id: i32,
) -> AppResult<Result<(User, Movie), Outcome>> {
    let user = match require_user(state, user_id).await? {
        Ok(user) => user,
        Err(outcome) => return Ok(Err(outcome)),
    };
    let movie = state.store.get_user_movies(user_id).await?.into_iter().find(|m| m.id == movie_id);
    Ok(match movie {
        Some(movie) => Ok((user, movie)),
        None => Err(Outcome::new(
            format!("/users/{user_id}"),
            Flash::error("Movie not found in your list."),
        )),
    })
}

fn failure(err: StoreError, user_id: Option<i32>, movie_id: Option<i32>) -> Flash {
    warn!(user_id = ?user_id, movie_id = ?movie_id, error = %err, "store operation failed");
    match err {
        StoreError::UserNotFound(_) => Flash::error("User not found."),
        StoreError::MovieNotFound(_) => Flash::error("Movie not found."),
        StoreError::NotInList { .. } => Flash::error("Movie is not in this list."),
        StoreError::AlreadyInList { .. } => Flash::error("Movie is already in this list."),
        StoreError::DuplicateUsername(name) => {
            Flash::error(format!("Username {name} is already taken!"))
        },
        StoreError::Invalid(reason) => Flash::error(format!("Invalid input: {reason}.")),
        StoreError::Storage(_) => Flash::error("Something went wrong. Please try again."),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, header},
    };
    use axum_extra::extract::cookie::Key;
    use tower::ServiceExt;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

    use super::*;
    use crate::{
        models::NewMovie,
        omdb::OmdbClient,
        store::SqliteStore,
    };

    async fn state(omdb_url: String) -> AppState {
        let db = crate::db::connect_and_migrate("sqlite::memory:").await.unwrap();
        AppState {
            store: Arc::new(SqliteStore::new(db)),
            omdb: Arc::new(OmdbClient::new(reqwest::Client::new(), "key".to_string(), omdb_url)),
            key: Key::generate(),
        }
    }

    fn offline() -> String {
        "http://127.0.0.1:1/".to_string()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        req.body(Body::empty()).unwrap()
    }

    fn location(resp: &Response) -> &str {
        resp.headers().get(header::LOCATION).unwrap().to_str().unwrap()
    }

    fn flash_cookie(resp: &Response) -> String {
        let set = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        set.split(';').next().unwrap().to_string()
    }

    async fn body(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn heat() -> NewMovie {
        NewMovie {
            title: "Heat".to_string(),
            director: "Michael Mann".to_string(),
            year: 1995,
            rating: 8.3,
        }
    }

    #[tokio::test]
    async fn duplicate_user_redirects_back_with_message() {
        let state = state(offline()).await;
        let app = router(state.clone());

        let resp = app.clone().oneshot(post_form("/add_user", "username=alice")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/users");

        let resp = app.clone().oneshot(post_form("/add_user", "username=alice")).await.unwrap();
        assert_eq!(location(&resp), "/add_user");
        let cookie = flash_cookie(&resp);

        let page = body(app.oneshot(get("/add_user", Some(&cookie))).await.unwrap()).await;
        assert!(page.contains("Username alice is already taken!"));
        assert_eq!(state.store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_user_page_is_not_found() {
        let app = router(state(offline()).await);

        let resp = app.clone().oneshot(get("/users/999", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app.oneshot(get("/nowhere", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lookup_miss_falls_back_to_manual_entry() {
        let state = state(offline()).await;
        let user = state.store.add_user("bob").await.unwrap();
        let app = router(state.clone());

        let uri = format!("/users/{}/add_movie", user.id);
        let form = "movie=Blade+Runner&year=1982";
        let resp = app.clone().oneshot(post_form(&uri, form)).await.unwrap();
        assert_eq!(
            location(&resp),
            format!("/users/{}/add_movie_manual?movie=Blade%20Runner&year=1982", user.id)
        );

        let uri = format!("/users/{}/add_movie_manual", user.id);
        let resp = app
            .oneshot(post_form(
                &uri,
                "movie=Blade+Runner&director=Ridley+Scott&year=1982&rating=8.1",
            ))
            .await
            .unwrap();
        assert_eq!(location(&resp), format!("/users/{}", user.id));

        let movies = state.store.get_user_movies(user.id).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].director, "Ridley Scott");
    }

    #[tokio::test]
    async fn lookup_hit_adds_movie() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Response": "True",
                "Title": "Inception",
                "Director": "Christopher Nolan",
                "Year": "2010",
                "imdbRating": "8.8"
            })))
            .mount(&server)
            .await;

        let state = state(server.uri()).await;
        let user = state.store.add_user("carol").await.unwrap();
        let app = router(state.clone());

        let uri = format!("/users/{}/add_movie", user.id);
        let resp = app.oneshot(post_form(&uri, "movie=inception&year=")).await.unwrap();
        assert_eq!(location(&resp), format!("/users/{}", user.id));

        let movies = state.store.get_user_movies(user.id).await.unwrap();
        assert_eq!(movies[0].title, "Inception");
        assert_eq!(movies[0].year, 2010);
    }

    #[tokio::test]
    async fn remove_route_only_touches_one_list() {
        let state = state(offline()).await;
        let a = state.store.add_user("a").await.unwrap();
        let b = state.store.add_user("b").await.unwrap();
        let movie = state.store.add_movie(heat(), a.id).await.unwrap();
        state.store.link_movie(b.id, movie.id).await.unwrap();
        let app = router(state.clone());

        let uri = format!("/users/{}/delete_movie/{}", a.id, movie.id);
        let resp = app.clone().oneshot(get(&uri, None)).await.unwrap();
        assert_eq!(location(&resp), format!("/users/{}", a.id));
        let cookie = flash_cookie(&resp);

        let list = format!("/users/{}", a.id);
        let page = body(app.oneshot(get(&list, Some(&cookie))).await.unwrap()).await;
        assert!(page.contains("Movie successfully removed from your list!"));
        assert!(state.store.get_user_movies(a.id).await.unwrap().is_empty());
        assert_eq!(state.store.get_user_movies(b.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_with_bad_year_keeps_movie() {
        let state = state(offline()).await;
        let a = state.store.add_user("a").await.unwrap();
        let movie = state.store.add_movie(heat(), a.id).await.unwrap();
        let app = router(state.clone());

        let uri = format!("/users/{}/update_movie/{}", a.id, movie.id);
        let resp = app
            .oneshot(post_form(&uri, "movie=Heat&director=Mann&year=soon&rating=9"))
            .await
            .unwrap();
        assert_eq!(location(&resp), uri);
        assert_eq!(state.store.find_movie(movie.id).await.unwrap(), Some(movie));
    }

    #[tokio::test]
    async fn update_requires_movie_in_users_list() {
        let state = state(offline()).await;
        let a = state.store.add_user("a").await.unwrap();
        let b = state.store.add_user("b").await.unwrap();
        let movie = state.store.add_movie(heat(), a.id).await.unwrap();
        let app = router(state.clone());

        let uri = format!("/users/{}/update_movie/{}", b.id, movie.id);
        let resp = app
            .oneshot(post_form(&uri, "movie=Heat&director=Mann&year=1995&rating=9"))
            .await
            .unwrap();
        assert_eq!(location(&resp), format!("/users/{}", b.id));
        assert_eq!(state.store.find_movie(movie.id).await.unwrap(), Some(movie));
    }

    #[tokio::test]
    async fn full_delete_route_clears_every_list() {
        let state = state(offline()).await;
        let a = state.store.add_user("a").await.unwrap();
        let b = state.store.add_user("b").await.unwrap();
        let movie = state.store.add_movie(heat(), a.id).await.unwrap();
        let app = router(state.clone());

        let uri = format!("/users/{}/link_movie", b.id);
        let form = format!("movie_id={}", movie.id);
        let resp = app.clone().oneshot(post_form(&uri, &form)).await.unwrap();
        assert_eq!(location(&resp), format!("/users/{}", b.id));
        assert_eq!(state.store.get_user_movies(b.id).await.unwrap().len(), 1);

        let resp = app
            .oneshot(post_form(&format!("/movies/{}/delete", movie.id), ""))
            .await
            .unwrap();
        assert_eq!(location(&resp), "/users");
        assert!(state.store.get_user_movies(a.id).await.unwrap().is_empty());
        assert!(state.store.get_user_movies(b.id).await.unwrap().is_empty());
    }

    #[test]
    fn store_failures_become_error_messages() {
        let flash = failure(StoreError::DuplicateUsername("alice".to_string()), None, None);
        assert_eq!(flash, Flash::error("Username alice is already taken!"));

        let flash = failure(StoreError::NotInList { user_id: 1, movie_id: 2 }, Some(1), Some(2));
        assert_eq!(flash, Flash::error("Movie is not in this list."));

        let storage = StoreError::Storage(sea_orm::DbErr::Custom("disk full".to_string()));
        let flash = failure(storage, Some(1), None);
        assert_eq!(flash, Flash::error("Something went wrong. Please try again."));
    }
}
