use crate::model::Movie;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Please check the url")]
    Unrecognized,
    #[error("Unknown sort column: {0}")]
    UnknownSortColumn(String),
}

/// Columns a client may order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    MovieType,
    Genre,
    Language,
    Runtime,
}

impl FromStr for SortColumn {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortColumn::Id),
            "name" => Ok(SortColumn::Name),
            "movie_type" => Ok(SortColumn::MovieType),
            "genre" => Ok(SortColumn::Genre),
            "language" => Ok(SortColumn::Language),
            "runtime" => Ok(SortColumn::Runtime),
            other => Err(QueryError::UnknownSortColumn(other.to_owned())),
        }
    }
}

impl SortColumn {
    fn compare(self, (a_id, a): &(u64, Movie), (b_id, b): &(u64, Movie)) -> Ordering {
        match self {
            SortColumn::Id => a_id.cmp(b_id),
            SortColumn::Name => a.name.cmp(&b.name),
            SortColumn::MovieType => a.movie_type.cmp(&b.movie_type),
            SortColumn::Genre => a.genre.cmp(&b.genre),
            SortColumn::Language => a.language.cmp(&b.language),
            SortColumn::Runtime => a.runtime.cmp(&b.runtime),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieQuery {
    All,
    TypeSorted { movie_type: String, sort: SortColumn },
    Type(String),
    Sorted(SortColumn),
    GenreContains(String),
}

impl MovieQuery {
    /// Picks the first shape that matches, in precedence order.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, QueryError> {
        // Empty values count as absent.
        let param = |key: &str| params.get(key).map(String::as_str).filter(|v| !v.is_empty());

        match params.len() {
            0 => Ok(MovieQuery::All),
            2 => match (param("type"), param("sort")) {
                (Some(movie_type), Some(sort)) => Ok(MovieQuery::TypeSorted {
                    movie_type: movie_type.to_owned(),
                    sort: sort.parse()?,
                }),
                _ => Err(QueryError::Unrecognized),
            },
            1 => {
                if let Some(movie_type) = param("type") {
                    Ok(MovieQuery::Type(movie_type.to_owned()))
                } else if let Some(sort) = param("sortBy") {
                    Ok(MovieQuery::Sorted(sort.parse()?))
                } else if let Some(genre) = param("searchByGenre") {
                    Ok(MovieQuery::GenreContains(genre.to_owned()))
                } else {
                    Err(QueryError::Unrecognized)
                }
            }
            _ => Err(QueryError::Unrecognized),
        }
    }

    /// Applies the query to movies given in store order.
    pub fn run(&self, mut movies: Vec<(u64, Movie)>) -> Vec<Movie> {
        match self {
            MovieQuery::All => {}
            MovieQuery::TypeSorted { movie_type, sort } => {
                movies.retain(|(_, m)| &m.movie_type == movie_type);
                movies.sort_by(|a, b| sort.compare(a, b));
            }
            MovieQuery::Type(movie_type) => movies.retain(|(_, m)| &m.movie_type == movie_type),
            MovieQuery::Sorted(sort) => movies.sort_by(|a, b| sort.compare(a, b)),
            MovieQuery::GenreContains(needle) => {
                movies.retain(|(_, m)| m.genre.contains(needle.as_str()))
            }
        }
        movies.into_iter().map(|(_, m)| m).collect()
    }
}
