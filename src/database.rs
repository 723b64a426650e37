use crate::model::*;
use sled::transaction::{TransactionError, Transactional};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sled(#[from] sled::Error),
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("corrupt record key ({0} bytes)")]
    CorruptKey(usize),
    #[error("username index points at missing user {0}")]
    DanglingIndex(u64),
}

pub type StoreResult<T> = Result<T, StoreError>;

// Big-endian so that tree iteration order is id order.
fn serialize_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn deserialize_id<V: AsRef<[u8]>>(id: V) -> StoreResult<u64> {
    let bytes = id.as_ref();
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::CorruptKey(bytes.len()))?;
    Ok(u64::from_be_bytes(array))
}

pub trait UserDb {
    type Error;
    /// Returns `None` when the username is already taken.
    fn add_user(&self, user: &User) -> Result<Option<u64>, Self::Error>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<(u64, User)>, Self::Error>;
}

pub trait MovieDb {
    type Error;
    fn add_movie(&self, movie: &Movie) -> Result<u64, Self::Error>;
    /// All movies in id order.
    fn movies(&self) -> Result<Vec<(u64, Movie)>, Self::Error>;
    fn has_movies(&self) -> Result<bool, Self::Error>;
}

pub(crate) const USERS: &[u8] = b"users";
const USERS_USERNAME: &[u8] = b"users_username";
const MOVIES: &[u8] = b"movies";

impl UserDb for sled::Db {
    type Error = StoreError;

    fn add_user(&self, user: &User) -> StoreResult<Option<u64>> {
        let users = self.open_tree(USERS)?;
        let users_username = self.open_tree(USERS_USERNAME)?;
        let id = self.generate_id()?;
        let record = bincode::serialize(user)?;
        let key = serialize_id(id);
        let result = (&users, &users_username).transaction(|(users, users_username)| {
            if users_username.get(user.username.as_bytes())?.is_some() {
                return sled::transaction::abort(());
            }
            users_username.insert(user.username.as_bytes(), &key[..])?;
            users.insert(&key[..], record.as_slice())?;
            Ok(())
        });
        match result {
            Ok(()) => Ok(Some(id)),
            Err(TransactionError::Abort(())) => Ok(None),
            Err(TransactionError::Storage(e)) => Err(e.into()),
        }
    }

    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<(u64, User)>> {
        let users_username = self.open_tree(USERS_USERNAME)?;
        let users = self.open_tree(USERS)?;
        let key = match users_username.get(username.as_bytes())? {
            Some(key) => key,
            None => return Ok(None),
        };
        let id = deserialize_id(&key)?;
        let data = users.get(&key)?.ok_or(StoreError::DanglingIndex(id))?;
        Ok(Some((id, bincode::deserialize(&data)?)))
    }
}

impl MovieDb for sled::Db {
    type Error = StoreError;

    fn add_movie(&self, movie: &Movie) -> StoreResult<u64> {
        let movies = self.open_tree(MOVIES)?;
        let id = self.generate_id()?;
        movies.insert(&serialize_id(id)[..], bincode::serialize(movie)?)?;
        Ok(id)
    }

    fn movies(&self) -> StoreResult<Vec<(u64, Movie)>> {
        let movies = self.open_tree(MOVIES)?;
        movies
            .iter()
            .map(|entry| -> StoreResult<(u64, Movie)> {
                let (key, data) = entry?;
                Ok((deserialize_id(&key)?, bincode::deserialize(&data)?))
            })
            .collect()
    }

    fn has_movies(&self) -> StoreResult<bool> {
        Ok(!self.open_tree(MOVIES)?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    fn user(username: &str) -> User {
        User {
            username: username.to_owned(),
            password_hash: "$2b$04$notarealhash".to_owned(),
            roles: None,
        }
    }

    fn movie(name: &str) -> Movie {
        Movie {
            name: name.to_owned(),
            movie_type: "Action".to_owned(),
            genre: "thriller".to_owned(),
            language: "English".to_owned(),
            runtime: 100,
        }
    }

    #[test]
    fn add_and_find_user() {
        let db = temp_db();
        let id = db.add_user(&user("alice")).unwrap().unwrap();
        let (found_id, found) = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(found_id, id);
        assert_eq!(found, user("alice"));
        assert!(db.get_user_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_is_rejected_without_writing() {
        let db = temp_db();
        assert!(db.add_user(&user("alice")).unwrap().is_some());
        let mut other = user("alice");
        other.roles = Some("admin".to_owned());
        assert_eq!(db.add_user(&other).unwrap(), None);
        assert_eq!(db.open_tree(USERS).unwrap().len(), 1);
        let (_, stored) = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(stored.roles, None);
    }

    #[test]
    fn movies_come_back_in_insertion_order() {
        let db = temp_db();
        assert!(!db.has_movies().unwrap());
        for name in &["Heat", "Alien", "Zodiac"] {
            db.add_movie(&movie(name)).unwrap();
        }
        assert!(db.has_movies().unwrap());
        let names: Vec<_> = db
            .movies()
            .unwrap()
            .into_iter()
            .map(|(_, m)| m.name)
            .collect();
        assert_eq!(names, vec!["Heat", "Alien", "Zodiac"]);
    }

    #[test]
    fn id_keys_round_trip() {
        assert_eq!(deserialize_id(serialize_id(258)).unwrap(), 258);
        assert!(matches!(
            deserialize_id([1u8, 2, 3]),
            Err(StoreError::CorruptKey(3))
        ));
    }
}
