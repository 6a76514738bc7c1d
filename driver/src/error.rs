use kernel::KernelError;

/// Classifies a foreign error into the kernel's taxonomy.
pub(crate) trait ConvertError: 'static + Sized {
    type Ok;
    fn convert_error(self) -> error_stack::Result<Self::Ok, KernelError>;
}
