#[macro_export]
macro_rules! opt {
    (, $default:ident) => {
        $default
    };
    ($optional:expr, $default:ident) => {
        $optional
    };
}

#[macro_export]
macro_rules! params_internal {
    ($vec:ident, required, $key:expr, $val:expr) => {
        $vec.push(($key, $val.to_string()));
    };
    ($vec:ident, optional, $key:expr, $val:expr) => {
        if let Some(ref v) = $val {
            $vec.push(($key, v.to_string()));
        }
    };
    ($vec:ident, joined, $key:expr, $val:expr) => {
        if !$val.is_empty() {
            $vec.push(($key, $val.join(",")));
        }
    };
}

/// The macros are used to more conveniently build request params for API endpoints.
/// The main one is `build_params!`. `required` always emits the param, `optional`
/// emits it when the `Option` is `Some`, and `joined` emits a comma-separated
/// value from a non-empty slice (e.g. `breed_ids=beng,abys`). Example:
/// ```
/// use catnip_util::build_params;
///
/// let limit = 12;
/// let breed_ids = vec!["beng".to_string(), "abys".to_string()];
/// let page: Option<u32> = None;
/// let params = build_params! {
///     required limit,
///     joined breed_ids,
///     optional page,
/// };
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! build_params {
    (
        $(
            $kind:ident $name:ident $( => $val:expr )?
        ),+ $(,)?
    ) => {
        {
            let mut params = Vec::new();
            $(
                $crate::params_internal!(
                    params,
                    $kind,
                    stringify!($name).to_string(),
                    $crate::opt!($( $val )?, $name)
                );
            )+
            params
        }
    };
}

#[cfg(test)]
mod test {
    #[test]
    fn test_required_and_optional() {
        let limit = 12;
        let page: Option<u32> = Some(3);
        let params = build_params! {
            required limit,
            optional page,
        };
        assert_eq!(
            params,
            vec![("limit".to_string(), "12".to_string()), ("page".to_string(), "3".to_string())]
        );
    }

    #[test]
    fn test_optional_absent() {
        let limit = 12;
        let page: Option<u32> = None;
        let params = build_params! {
            required limit,
            optional page,
        };
        assert_eq!(params, vec![("limit".to_string(), "12".to_string())]);
    }

    #[test]
    fn test_joined() {
        let breed_ids = vec!["beng".to_string(), "abys".to_string()];
        let params = build_params! { joined breed_ids };
        assert_eq!(params, vec![("breed_ids".to_string(), "beng,abys".to_string())]);
    }

    #[test]
    fn test_joined_empty_is_omitted() {
        let breed_ids: Vec<String> = vec![];
        let params = build_params! { joined breed_ids };
        assert!(params.is_empty());
    }
}
