/// Short, human-readable component name from `std::any::type_name`.
///
/// Strips module paths and generic arguments:
/// `"prolong_pipeline::components::Foo<my_crate::Bar>"` becomes `"Foo"`.
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_paths_and_generics() {
        assert_eq!(short_type_name("a::b::StopValidityFilter"), "StopValidityFilter");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
