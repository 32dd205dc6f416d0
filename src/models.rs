use serde::Deserialize;

use crate::entities::{movie, user};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct User {
    pub id: i32,
    pub username: String,
}

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self { id: m.id, username: m.username }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub director: String,
    pub year: i32,
    pub rating: f64,
}

impl From<movie::Model> for Movie {
    fn from(m: movie::Model) -> Self {
        Self { id: m.id, title: m.title, director: m.director, year: m.year, rating: m.rating }
    }
}

/// The four user-editable fields of a movie, used both for inserts and full overwrites.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub director: String,
    pub year: i32,
    pub rating: f64,
}

/// Normalized metadata returned by the movie provider.
#[derive(Clone, Debug, PartialEq)]
pub struct MovieDetails {
    pub title: String,
    pub director: String,
    pub year: i32,
    pub rating: f64,
    pub plot: Option<String>,
    pub poster: Option<String>,
}

impl From<MovieDetails> for NewMovie {
    fn from(d: MovieDetails) -> Self {
        Self { title: d.title, director: d.director, year: d.year, rating: d.rating }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddUserForm {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct LookupForm {
    pub movie: String,
    #[serde(default)]
    pub year: String,
}

/// Manual entry and update forms share these fields. Numbers stay as text until the
/// handler parses them so bad input becomes a status message rather than a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct MovieForm {
    pub movie: String,
    pub director: String,
    pub year: String,
    pub rating: String,
}

impl MovieForm {
    pub fn parse(&self) -> Result<NewMovie, String> {
        let year = self
            .year
            .trim()
            .parse::<i32>()
            .map_err(|_| format!("'{}' is not a valid year", self.year.trim()))?;
        let rating = self
            .rating
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|r| r.is_finite())
            .ok_or_else(|| format!("'{}' is not a valid rating", self.rating.trim()))?;

        Ok(NewMovie {
            title: self.movie.trim().to_string(),
            director: self.director.trim().to_string(),
            year,
            rating,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LinkForm {
    pub movie_id: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ManualQuery {
    #[serde(default)]
    pub movie: String,
    #[serde(default)]
    pub year: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_form_parses_trimmed_fields() {
        let form = MovieForm {
            movie: " Heat ".into(),
            director: "Michael Mann".into(),
            year: " 1995".into(),
            rating: "8.3 ".into(),
        };
        let parsed = form.parse().unwrap();
        assert_eq!(parsed.title, "Heat");
        assert_eq!(parsed.year, 1995);
        assert_eq!(parsed.rating, 8.3);
    }

    #[test]
    fn movie_form_rejects_bad_numbers() {
        let form = MovieForm {
            movie: "Heat".into(),
            director: "Michael Mann".into(),
            year: "nineteen".into(),
            rating: "8".into(),
        };
        assert!(form.parse().unwrap_err().contains("year"));

        let form = MovieForm { year: "1995".into(), rating: "NaN".into(), ..form };
        assert!(form.parse().unwrap_err().contains("rating"));
    }
}
