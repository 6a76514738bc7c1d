use error_stack::ResultExt;
use kernel::KernelError;

pub mod database;
mod error;

pub(crate) fn env(key: &str) -> error_stack::Result<String, KernelError> {
    dotenvy::var(key)
        .change_context(KernelError::Internal)
        .attach_printable_lazy(|| format!("Failed to read env: {key}"))
}

/// Optional variable, parsed. Absent means `None`; present but unparsable is an error.
pub(crate) fn env_parse<T>(key: &str) -> error_stack::Result<Option<T>, KernelError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match dotenvy::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .change_context(KernelError::Internal)
            .attach_printable_lazy(|| format!("Invalid value for env {key}: {value}")),
        Err(dotenvy::Error::EnvVar(std::env::VarError::NotPresent)) => Ok(None),
        Err(error) => Err(error)
            .change_context(KernelError::Internal)
            .attach_printable_lazy(|| format!("Failed to read env: {key}")),
    }
}
