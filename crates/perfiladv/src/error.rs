#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Unable to determine the user cache directory")]
    NoCacheDir,
}
