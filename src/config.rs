/// Options controlling how a query is tokenized and parsed.
///
/// The default configuration accepts standard RFC 9535 syntax only.
///
/// # Examples
///
/// ```
/// use jsonpath_overlay::Config;
///
/// let config = Config::default().with_property_name_extension();
/// assert!(config.property_name_extension());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    property_name_extension: bool,
}

impl Config {
    /// Enables the non-standard `~` operator, which selects the key name of
    /// a matched mapping entry instead of its value.
    pub fn with_property_name_extension(mut self) -> Self {
        self.property_name_extension = true;
        self
    }

    pub fn property_name_extension(&self) -> bool {
        self.property_name_extension
    }
}
