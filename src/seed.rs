use crate::database::{MovieDb, StoreError};
use crate::model::Movie;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("cannot read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed seed file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Loads a JSON array of movies into the store, unless it already has some.
/// Returns how many movies were inserted.
pub fn seed_movies(db: &sled::Db, path: &Path) -> Result<usize, SeedError> {
    if db.has_movies()? {
        return Ok(0);
    }
    let movies: Vec<Movie> = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    for movie in &movies {
        db.add_movie(movie)?;
    }
    Ok(movies.len())
}
