use maud::{DOCTYPE, Markup, html};

use crate::{
    flash::{Flash, Level},
    models::{ManualQuery, Movie, User},
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

const INPUT: &str = "mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500";
const BUTTON: &str = "rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700";
const LINK: &str = "text-sm text-blue-600 hover:text-blue-800";

pub fn users_page(users: &[User], flash: Option<&Flash>) -> String {
    page(
        "Users",
        flash,
        html! {
            div class="flex items-start justify-between gap-6" {
                h1 class="text-3xl font-bold text-gray-900" { "Users" }
                a class=(LINK) href="/add_user" { "Add user" }
            }
            @if users.is_empty() {
                p class="mt-6 text-gray-600" { "No users yet." }
            } @else {
                ul class="mt-6 divide-y divide-gray-200" {
                    @for user in users {
                        li class="py-3" {
                            a class="text-lg text-gray-900 hover:text-blue-700" href=(format!("/users/{}", user.id)) { (user.username) }
                        }
                    }
                }
            }
        },
    )
}

pub fn add_user_page(flash: Option<&Flash>) -> String {
    page(
        "Add user",
        flash,
        html! {
            h1 class="text-3xl font-bold text-gray-900" { "Add user" }
            form class="mt-8 space-y-6" method="post" action="/add_user" {
                div {
                    label class="block text-sm font-medium text-gray-700" for="username" { "Username" }
                    input class=(INPUT) name="username" id="username" maxlength="80" required;
                }
                button class=(BUTTON) type="submit" { "Add" }
            }
            a class=(LINK) href="/users" { "Back to users" }
        },
    )
}

pub fn user_movies_page(
    user: &User,
    movies: &[Movie],
    others: &[Movie],
    flash: Option<&Flash>,
) -> String {
    page(
        &format!("{}'s movies", user.username),
        flash,
        html! {
            div class="flex items-start justify-between gap-6" {
                h1 class="text-3xl font-bold text-gray-900" { (user.username) "'s movies" }
                a class=(LINK) href=(format!("/users/{}/add_movie", user.id)) { "Add movie" }
            }
            @if movies.is_empty() {
                p class="mt-6 text-gray-600" { "No movies in this list yet." }
            } @else {
                ul class="mt-6 space-y-4" {
                    @for movie in movies {
                        li class="bg-white shadow rounded-lg p-4" {
                            h2 class="text-xl font-semibold text-gray-900" {
                                (movie.title)
                                span class="ml-2 font-normal text-gray-500" { "(" (movie.year) ")" }
                            }
                            p class="text-sm text-gray-600" { "Directed by " (movie.director) " · Rating " (movie.rating) }
                            div class="mt-2 flex gap-4" {
                                a class=(LINK) href=(format!("/users/{}/update_movie/{}", user.id, movie.id)) { "Update" }
                                a class=(LINK) href=(format!("/users/{}/delete_movie/{}", user.id, movie.id)) { "Remove from list" }
                                form method="post" action=(format!("/movies/{}/delete", movie.id)) {
                                    button class="text-sm text-red-600 hover:text-red-800" type="submit" { "Delete everywhere" }
                                }
                            }
                        }
                    }
                }
            }
            @if !others.is_empty() {
                form class="mt-8 flex items-end gap-4" method="post" action=(format!("/users/{}/link_movie", user.id)) {
                    div class="flex-1" {
                        label class="block text-sm font-medium text-gray-700" for="movie_id" { "Add a movie from another list" }
                        select class=(INPUT) name="movie_id" id="movie_id" {
                            @for movie in others {
                                option value=(movie.id) { (movie.title) " (" (movie.year) ")" }
                            }
                        }
                    }
                    button class=(BUTTON) type="submit" { "Add" }
                }
            }
            a class=(LINK) href="/users" { "Back to users" }
        },
    )
}

pub fn add_movie_page(user: &User, flash: Option<&Flash>) -> String {
    page(
        "Add movie",
        flash,
        html! {
            h1 class="text-3xl font-bold text-gray-900" { "Add a movie for " (user.username) }
            form class="mt-8 space-y-6" method="post" action=(format!("/users/{}/add_movie", user.id)) {
                div {
                    label class="block text-sm font-medium text-gray-700" for="movie" { "Title" }
                    input class=(INPUT) name="movie" id="movie" required;
                }
                div {
                    label class="block text-sm font-medium text-gray-700" for="year" { "Year (optional)" }
                    input class=(INPUT) name="year" id="year" inputmode="numeric";
                }
                button class=(BUTTON) type="submit" { "Look up" }
            }
            a class=(LINK) href=(format!("/users/{}", user.id)) { "Back" }
        },
    )
}

pub fn add_movie_manual_page(user: &User, prefill: &ManualQuery, flash: Option<&Flash>) -> String {
    page(
        "Add movie manually",
        flash,
        html! {
            h1 class="text-3xl font-bold text-gray-900" { "Enter movie details" }
            form class="mt-8 space-y-6" method="post" action=(format!("/users/{}/add_movie_manual", user.id)) {
                (movie_fields(&prefill.movie, "", &prefill.year, ""))
                button class=(BUTTON) type="submit" { "Add" }
            }
            a class=(LINK) href=(format!("/users/{}", user.id)) { "Back" }
        },
    )
}

pub fn update_movie_page(user: &User, movie: &Movie, flash: Option<&Flash>) -> String {
    page(
        "Update movie",
        flash,
        html! {
            h1 class="text-3xl font-bold text-gray-900" { "Update " (movie.title) }
            form class="mt-8 space-y-6" method="post" action=(format!("/users/{}/update_movie/{}", user.id, movie.id)) {
                (movie_fields(&movie.title, &movie.director, &movie.year.to_string(), &movie.rating.to_string()))
                button class=(BUTTON) type="submit" { "Save" }
            }
            a class=(LINK) href=(format!("/users/{}", user.id)) { "Back" }
        },
    )
}

pub fn not_found_page() -> String {
    page(
        "Not found",
        None,
        html! {
            h1 class="text-2xl font-bold text-gray-900" { "Page not found" }
            a class=(LINK) href="/users" { "Back to users" }
        },
    )
}

pub fn error_page(message: &str) -> String {
    page(
        "Error",
        None,
        html! {
            h1 class="text-2xl font-bold text-gray-900" { "Error" }
            p class="mt-4 text-gray-700" { (message) }
            a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/users" { "Back" }
        },
    )
}

fn movie_fields(title: &str, director: &str, year: &str, rating: &str) -> Markup {
    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for="movie" { "Title" }
            input class=(INPUT) name="movie" id="movie" value=(title) maxlength="120" required;
        }
        div {
            label class="block text-sm font-medium text-gray-700" for="director" { "Director" }
            input class=(INPUT) name="director" id="director" value=(director) maxlength="120" required;
        }
        div {
            label class="block text-sm font-medium text-gray-700" for="year" { "Year" }
            input class=(INPUT) name="year" id="year" value=(year) inputmode="numeric" required;
        }
        div {
            label class="block text-sm font-medium text-gray-700" for="rating" { "Rating" }
            input class=(INPUT) name="rating" id="rating" value=(rating) inputmode="decimal" required;
        }
    }
}

fn flash_banner(flash: &Flash) -> Markup {
    let colors = match flash.level {
        Level::Success => "bg-green-50 text-green-800 border-green-300",
        Level::Info => "bg-blue-50 text-blue-800 border-blue-300",
        Level::Error => "bg-red-50 text-red-800 border-red-300",
    };

    html! {
        div class=(format!("mb-6 rounded-md border px-4 py-3 {colors}")) data-level=(flash.level.as_str()) {
            (flash.message)
        }
    }
}

fn page(title: &str, flash: Option<&Flash>, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · MoviWeb" }
                script src=(TAILWIND_CDN) {}
            }
            body class="min-h-screen bg-gray-50" {
                div class="max-w-2xl mx-auto px-6 py-12" {
                    @if let Some(flash) = flash {
                        (flash_banner(flash))
                    }
                    (body)
                }
            }
        }
    }
    .into_string()
}
