use crate::{
    api::{attendance, employee, leave_request, payroll},
    auth::middleware::auth_middleware,
    config::Config,
    store::HrStore,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use tracing::warn;

/// Per-IP limiter refilling `requests_per_min` tokens a minute.
pub fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / u64::from(requests_per_min)).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

/// Mounts the protected API; handlers read `web::Data<S>` and `web::Data<Config>`.
pub fn configure<S: HrStore + 'static>(cfg: &mut web::ServiceConfig, config: &Config) {
    let api = web::scope(&config.api_prefix)
        .service(
            web::scope("/employees")
                // /employees
                .service(
                    web::resource("")
                        .route(web::post().to(employee::create_employee::<S>))
                        .route(web::get().to(employee::list_employees::<S>)),
                )
                // /employees/{id}
                .service(web::resource("/{id}").route(web::get().to(employee::get_employee::<S>))),
        )
        .service(
            web::scope("/leaves")
                // /leaves
                .service(
                    web::resource("")
                        .route(web::get().to(leave_request::leave_list::<S>))
                        .route(web::post().to(leave_request::create_leave::<S>)),
                )
                // /leaves/{id}
                .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave::<S>)))
                // /leaves/{id}/approve
                .service(
                    web::resource("/{id}/approve")
                        .route(web::post().to(leave_request::approve_leave::<S>)),
                )
                // /leaves/{id}/reject
                .service(
                    web::resource("/{id}/reject")
                        .route(web::post().to(leave_request::reject_leave::<S>)),
                )
                // /leaves/{id}/comment
                .service(
                    web::resource("/{id}/comment")
                        .route(web::put().to(leave_request::comment_leave::<S>)),
                ),
        )
        .service(
            web::scope("/attendance")
                // /attendance
                .service(
                    web::resource("")
                        .route(web::get().to(attendance::list_attendance::<S>))
                        .route(web::post().to(attendance::create_attendance::<S>)),
                )
                .service(web::resource("/check-in").route(web::post().to(attendance::check_in::<S>)))
                .service(web::resource("/check-out").route(web::post().to(attendance::check_out::<S>)))
                .service(
                    web::resource("/monthly-summary")
                        .route(web::get().to(attendance::monthly_summary::<S>)),
                ),
        )
        .service(
            web::scope("/payroll")
                // /payroll
                .service(
                    web::resource("")
                        .route(web::post().to(payroll::create_payroll::<S>))
                        .route(web::get().to(payroll::list_payrolls::<S>)),
                )
                // /payroll/{id}
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(payroll::get_payroll::<S>))
                        .route(web::put().to(payroll::update_payroll::<S>)),
                ),
        )
        .wrap(from_fn(auth_middleware));

    // outermost: throttles before authentication
    match build_limiter(config.rate_protected_per_min) {
        Some(limiter) => {
            cfg.service(api.wrap(limiter));
        }
        None => {
            warn!(
                rate = config.rate_protected_per_min,
                "Invalid rate limit configuration, serving without a limiter"
            );
            cfg.service(api);
        }
    }
}
