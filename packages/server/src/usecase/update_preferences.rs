//! UseCase: 表示名・言語設定の更新

use crate::domain::{Connection, LanguageCode, Preferences};

#[derive(Debug, Default)]
pub struct UpdatePreferencesUseCase;

impl UpdatePreferencesUseCase {
    pub fn new() -> Self {
        Self
    }

    /// Apply a `preferences` message to `connection`.
    ///
    /// Blank fields keep the previous value. An invalid language code is
    /// ignored with a warning; the name in the same message is still applied.
    pub fn execute(
        &self,
        connection: &Connection,
        language: Option<&str>,
        name: Option<&str>,
    ) -> Preferences {
        let language = language
            .filter(|language| !language.trim().is_empty())
            .and_then(|language| match LanguageCode::new(language) {
                Ok(code) => Some(code),
                Err(e) => {
                    tracing::warn!(
                        "Ignoring language '{}' from '{}': {}",
                        language,
                        connection.id(),
                        e
                    );
                    None
                }
            });

        let preferences = connection.update_preferences(language, name);
        tracing::info!(
            "Connection '{}' set preferences: language={}, name={}",
            connection.id(),
            preferences.language,
            preferences.display_name
        );
        preferences
    }
}
