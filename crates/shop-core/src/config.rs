/// Loads service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize`; field `database_url` reads
/// `DATABASE_URL`, and so on. Use `#[serde(default = ...)]` for optional vars.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Like [`Config::from_env`] but reads from an explicit variable list.
    fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}
