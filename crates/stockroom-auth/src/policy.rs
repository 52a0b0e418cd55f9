//! Role policy for protected routes
//!
//! A pure decision over (method, path, role). Reads are open to every
//! authenticated role; writes to stock levels and warehouse locations need
//! `super_admin`; any other write needs `admin` or above.

use http::Method;

use crate::error::{AuthError, AuthResult};
use crate::types::Role;

/// Path prefixes whose mutations are reserved for `super_admin`
pub const SUPER_ADMIN_PREFIXES: &[&str] = &["/api/product-stocks", "/api/warehouse-locations"];

/// Decide whether `role` may perform `method` on `path`.
pub fn authorize(method: &Method, path: &str, role: Role) -> AuthResult<()> {
    if is_read(method) {
        return Ok(());
    }

    let allowed = if SUPER_ADMIN_PREFIXES.iter().any(|p| path_has_prefix(path, p)) {
        role == Role::SuperAdmin
    } else {
        matches!(role, Role::SuperAdmin | Role::Admin)
    };

    if allowed {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

fn is_read(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS
}

/// Segment-aware prefix match: `/api/product-stocks/1` matches,
/// `/api/product-stocks-archive` does not.
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_open_to_all() {
        for role in [Role::User, Role::Admin, Role::SuperAdmin] {
            assert!(authorize(&Method::GET, "/api/product-stocks", role).is_ok());
            assert!(authorize(&Method::HEAD, "/api/products/1", role).is_ok());
            assert!(authorize(&Method::OPTIONS, "/api/warehouse-locations", role).is_ok());
        }
    }

    #[test]
    fn test_stock_and_warehouse_writes_need_super_admin() {
        for path in ["/api/product-stocks", "/api/warehouse-locations/42"] {
            for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
                assert!(authorize(&method, path, Role::SuperAdmin).is_ok());
                assert!(matches!(
                    authorize(&method, path, Role::Admin),
                    Err(AuthError::Forbidden)
                ));
                assert!(authorize(&method, path, Role::User).is_err());
            }
        }
    }

    #[test]
    fn test_other_writes_need_admin() {
        for path in ["/api/products", "/api/product-categories/7"] {
            assert!(authorize(&Method::POST, path, Role::SuperAdmin).is_ok());
            assert!(authorize(&Method::PUT, path, Role::Admin).is_ok());
            assert!(authorize(&Method::DELETE, path, Role::User).is_err());
        }
    }

    #[test]
    fn test_prefix_is_segment_aware() {
        assert!(authorize(&Method::POST, "/api/product-stocks-archive", Role::Admin).is_ok());
        assert!(authorize(&Method::POST, "/api/product-stocks/", Role::Admin).is_err());
    }
}
