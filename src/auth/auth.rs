use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

/// The verified caller of a request.
///
/// Every query and mutation goes through the capability checks below, so
/// "admin sees all, employee sees own" is decided in exactly one place.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub employee_id: u64,
    pub username: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(ErrorUnauthorized("Missing token"))),
        }
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Admin only"))
        }
    }

    /// Admins may touch anyone's records, employees only their own.
    pub fn require_owner_or_admin(&self, owner_id: u64) -> AppResult<()> {
        if self.is_admin() || self.employee_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Not allowed to access another employee's records"))
        }
    }

    /// Narrows a listing filter to what the caller may see.
    ///
    /// Admins keep their filter (`None` = everyone); employees are pinned to
    /// themselves and may not ask for someone else.
    pub fn scope(&self, requested: Option<u64>) -> AppResult<Option<u64>> {
        if self.is_admin() {
            return Ok(requested);
        }
        match requested {
            Some(id) if id != self.employee_id => Err(AppError::Unauthorized(
                "Not allowed to access another employee's records",
            )),
            _ => Ok(Some(self.employee_id)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{admin, employee};
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn employee_scope_is_pinned_to_self() {
        let me = employee(5);
        assert_eq!(me.scope(None).unwrap(), Some(5));
        assert_eq!(me.scope(Some(5)).unwrap(), Some(5));
        assert!(matches!(me.scope(Some(6)), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn admin_scope_keeps_filter() {
        let boss = admin(1);
        assert_eq!(boss.scope(None).unwrap(), None);
        assert_eq!(boss.scope(Some(6)).unwrap(), Some(6));
    }

    #[test]
    fn owner_checks() {
        assert!(employee(5).require_owner_or_admin(5).is_ok());
        assert!(employee(5).require_owner_or_admin(6).is_err());
        assert!(admin(1).require_owner_or_admin(6).is_ok());
        assert!(employee(5).require_admin().is_err());
    }

    #[actix_web::test]
    async fn extractor_reads_user_inserted_by_middleware() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(employee(9));
        let user = AuthUser::extract(&req).await.unwrap();
        assert_eq!(user.employee_id, 9);
    }

    #[actix_web::test]
    async fn extractor_rejects_anonymous_request() {
        let req = TestRequest::default().to_http_request();
        assert!(AuthUser::extract(&req).await.is_err());
    }
}
