//! Data models for medialist
//!
//! Defines the core data structures: lists, and the three media kinds
//! (movies, TV series, anime) that lists can reference.
//!
//! Entities are keyed by their external catalog id, which is unique
//! within a kind but not across kinds. They are immutable once stored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named, user-owned collection of media
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListRecord {
    /// Caller-assigned unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Username of the owner
    pub owner: String,
}

impl ListRecord {
    /// Create a new list record
    pub fn new(id: i64, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: owner.into(),
        }
    }
}

/// The media kinds a list can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    TvSeries,
    Anime,
}

impl MediaKind {
    /// All kinds, in cascade order
    pub const ALL: [MediaKind; 3] = [MediaKind::Movie, MediaKind::TvSeries, MediaKind::Anime];

    /// Short label, also used as the database entity table name
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::TvSeries => "tv_series",
            MediaKind::Anime => "anime",
        }
    }

    /// Flat file holding entity records of this kind
    pub fn entity_file_name(self) -> &'static str {
        match self {
            MediaKind::Movie => "movies.csv",
            MediaKind::TvSeries => "tv_series.csv",
            MediaKind::Anime => "anime.csv",
        }
    }

    /// Flat file holding `(listId, entityId)` pairs of this kind
    pub fn membership_file_name(self) -> &'static str {
        match self {
            MediaKind::Movie => "list_movie.csv",
            MediaKind::TvSeries => "list_tv_series.csv",
            MediaKind::Anime => "list_anime.csv",
        }
    }

    /// Database join table, `list_<kind>`
    pub fn join_table(self) -> &'static str {
        match self {
            MediaKind::Movie => "list_movie",
            MediaKind::TvSeries => "list_tv_series",
            MediaKind::Anime => "list_anime",
        }
    }

    /// Entity id column in the join table, `id<Kind>`
    pub fn join_column(self) -> &'static str {
        match self {
            MediaKind::Movie => "idMovie",
            MediaKind::TvSeries => "idTvSeries",
            MediaKind::Anime => "idAnime",
        }
    }

    /// Names of the two numeric attributes, in record order
    pub fn attribute_names(self) -> (&'static str, &'static str) {
        match self {
            MediaKind::Movie => ("runtime", "release_year"),
            MediaKind::TvSeries => ("seasons", "episodes"),
            MediaKind::Anime => ("episodes", "release_year"),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaKind::Movie),
            "series" | "tv" | "tv_series" | "tv-series" => Ok(MediaKind::TvSeries),
            "anime" => Ok(MediaKind::Anime),
            other => Err(format!(
                "unknown media kind '{}', expected movie, series or anime",
                other
            )),
        }
    }
}

/// Common shape of every media entity
///
/// Each kind has an id, a title and exactly two numeric attributes,
/// which lets every store be written once and instantiated per kind.
pub trait MediaEntity:
    Clone + fmt::Debug + PartialEq + Serialize + Send + Sync + 'static
{
    const KIND: MediaKind;

    fn id(&self) -> i64;

    fn title(&self) -> &str;

    /// The two numeric attributes, in record order
    fn attributes(&self) -> (i64, i64);

    /// Rebuild an entity from its stored parts
    fn from_parts(id: i64, first: i64, second: i64, title: String) -> Self;
}

/// A movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    /// Runtime in minutes
    pub runtime: i64,
    #[serde(default)]
    pub release_year: i64,
}

impl Movie {
    pub fn new(id: i64, title: impl Into<String>, runtime: i64) -> Self {
        Self {
            id,
            title: title.into(),
            runtime,
            release_year: 0,
        }
    }

    pub fn with_release_year(mut self, year: i64) -> Self {
        self.release_year = year;
        self
    }
}

impl MediaEntity for Movie {
    const KIND: MediaKind = MediaKind::Movie;

    fn id(&self) -> i64 {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn attributes(&self) -> (i64, i64) {
        (self.runtime, self.release_year)
    }

    fn from_parts(id: i64, first: i64, second: i64, title: String) -> Self {
        Self {
            id,
            title,
            runtime: first,
            release_year: second,
        }
    }
}

/// A TV series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TvSeries {
    pub id: i64,
    pub title: String,
    pub seasons: i64,
    pub episodes: i64,
}

impl TvSeries {
    pub fn new(id: i64, title: impl Into<String>, seasons: i64, episodes: i64) -> Self {
        Self {
            id,
            title: title.into(),
            seasons,
            episodes,
        }
    }
}

impl MediaEntity for TvSeries {
    const KIND: MediaKind = MediaKind::TvSeries;

    fn id(&self) -> i64 {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn attributes(&self) -> (i64, i64) {
        (self.seasons, self.episodes)
    }

    fn from_parts(id: i64, first: i64, second: i64, title: String) -> Self {
        Self {
            id,
            title,
            seasons: first,
            episodes: second,
        }
    }
}

/// An anime title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Anime {
    pub id: i64,
    pub title: String,
    pub episodes: i64,
    #[serde(default)]
    pub release_year: i64,
}

impl Anime {
    pub fn new(id: i64, title: impl Into<String>, episodes: i64) -> Self {
        Self {
            id,
            title: title.into(),
            episodes,
            release_year: 0,
        }
    }

    pub fn with_release_year(mut self, year: i64) -> Self {
        self.release_year = year;
        self
    }
}

impl MediaEntity for Anime {
    const KIND: MediaKind = MediaKind::Anime;

    fn id(&self) -> i64 {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn attributes(&self) -> (i64, i64) {
        (self.episodes, self.release_year)
    }

    fn from_parts(id: i64, first: i64, second: i64, title: String) -> Self {
        Self {
            id,
            title,
            episodes: first,
            release_year: second,
        }
    }
}

/// Everything a list holds, across all media kinds
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListContents {
    pub list: ListRecord,
    pub movies: Vec<Movie>,
    pub series: Vec<TvSeries>,
    pub anime: Vec<Anime>,
}

impl ListContents {
    /// Total number of members across kinds
    pub fn len(&self) -> usize {
        self.movies.len() + self.series.len() + self.anime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
