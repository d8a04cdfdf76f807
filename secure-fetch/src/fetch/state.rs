//! Published fetch state.

use super::error::FetchError;

/// State of a fetch cycle as seen by its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    /// A cycle is in flight.
    Loading,

    /// The cycle finished with data.
    Success(T),

    /// The cycle finished with an error.
    Failure(FetchError),
}

impl<T> FetchState<T> {
    /// Returns true while a cycle is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns the fetched data, if the cycle succeeded.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the error message, if the cycle failed.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.failure().map(ToString::to_string)
    }

    /// Returns the typed error, if the cycle failed.
    #[must_use]
    pub fn failure(&self) -> Option<&FetchError> {
        match self {
            Self::Failure(error) => Some(error),
            _ => None,
        }
    }

    /// Consumes the state, yielding data on success.
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> From<Result<T, FetchError>> for FetchState<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(error) => Self::Failure(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_has_neither_data_nor_error() {
        let state: FetchState<u32> = FetchState::default();
        assert!(state.is_loading());
        assert!(state.data().is_none());
        assert!(state.error().is_none());
    }

    #[test]
    fn settled_states_expose_exactly_one_side() {
        let ok: FetchState<u32> = Ok(7).into();
        assert!(!ok.is_loading());
        assert_eq!(ok.data(), Some(&7));
        assert!(ok.error().is_none());

        let failed: FetchState<u32> = Err(FetchError::Http { status: 500 }).into();
        assert!(!failed.is_loading());
        assert!(failed.data().is_none());
        assert_eq!(failed.error().as_deref(), Some("HTTP error! status: 500"));
    }
}
