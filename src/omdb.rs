use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::MovieDetails;

#[derive(Clone, Debug, PartialEq)]
pub enum Lookup {
    Found(MovieDetails),
    NotFound,
}

/// Client for the OMDb metadata API.
///
/// Every failure (transport, status, decoding, "not found" payload) collapses into
/// [`Lookup::NotFound`]; callers fall back to manual entry and never see why.
pub struct OmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OmdbClient {
    pub fn new(client: reqwest::Client, api_key: String, base_url: String) -> Self {
        if api_key.trim().is_empty() {
            warn!("no OMDB_API_KEY provided, every movie will need manual entry");
        }
        Self { client, api_key, base_url }
    }

    pub async fn lookup(&self, title: &str, year: Option<i32>) -> Lookup {
        if self.api_key.trim().is_empty() {
            return Lookup::NotFound;
        }

        match self.fetch(title, year).await {
            Ok(Some(details)) => {
                debug!(title = %title, found = %details.title, "movie found");
                Lookup::Found(details)
            },
            Ok(None) => {
                debug!(title = %title, year = ?year, "movie not found");
                Lookup::NotFound
            },
            Err(err) => {
                warn!(title = %title, error = %err, "movie lookup failed");
                Lookup::NotFound
            },
        }
    }

    async fn fetch(&self, title: &str, year: Option<i32>) -> reqwest::Result<Option<MovieDetails>> {
        let mut req = self
            .client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), ("t", title)]);
        if let Some(year) = year {
            req = req.query(&[("y", year)]);
        }

        let resp: OmdbResponse = req.send().await?.error_for_status()?.json().await?;
        Ok(resp.into_details())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbResponse {
    response: String,
    title: Option<String>,
    director: Option<String>,
    year: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    plot: Option<String>,
    poster: Option<String>,
}

impl OmdbResponse {
    fn into_details(self) -> Option<MovieDetails> {
        if self.response != "True" {
            return None;
        }

        let title = present(self.title)?;
        let director = present(self.director)?;
        let year = self.year.as_deref().and_then(parse_year)?;
        let rating = self.imdb_rating.as_deref().and_then(|r| r.trim().parse::<f64>().ok())?;

        Some(MovieDetails {
            title,
            director,
            year,
            rating,
            plot: present(self.plot),
            poster: present(self.poster),
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty() && s != "N/A")
}

// Series report ranges such as "2008–2013".
fn parse_year(raw: &str) -> Option<i32> {
    let digits: String = raw.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    (digits.len() == 4).then(|| digits.parse().ok()).flatten()
}
