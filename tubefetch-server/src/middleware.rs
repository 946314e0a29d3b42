/* This file is part of the TubeFetch project
*
*  Copyright (C) 2025 TubeFetch contributors
*  
*  This program is free software: you can redistribute it and/or modify
*  it under the terms of the GNU Affero General Public License as published by
*  the Free Software Foundation, either version 3 of the License, or
*  (at your option) any later version.
*
*  This program is distributed in the hope that it will be useful,
*  but WITHOUT ANY WARRANTY; without even the implied warranty of
*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
*  GNU Affero General Public License for more details.
*
*  You should have received a copy of the GNU Affero General Public License
*  along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
use std::future::{ready, Ready};

use actix_web::body::{BoxBody, EitherBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::Error;
use actix_web::http::{header::ContentType, StatusCode};
use actix_web::{web, HttpResponse};
use futures::{future::LocalBoxFuture, FutureExt};

use crate::{errors::ApiErrorMarker, pages::ErrorPage};

pub const NOT_FOUND_PAGE_MSG: &str = "Page not found";
pub const SERVER_ERROR_PAGE_MSG: &str = "Internal server error";

/// Replaces 404 and 500 responses with the HTML error page,
/// unless they carry a json [`ApiErrorMarker`] error
pub struct ErrorPages;

impl<S, B> Transform<S, ServiceRequest> for ErrorPages
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = ErrorPagesInstance<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorPagesInstance { service }))
    }
}

pub struct ErrorPagesInstance<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for ErrorPagesInstance<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let page = req.app_data::<web::Data<ErrorPage>>().cloned();

        let srv = self.service.call(req);

        async move {
            let resp = srv.await?.map_into_left_body();
            if resp.response().extensions().contains::<ApiErrorMarker>() {
                return Ok(resp);
            }
            let message = match resp.status() {
                StatusCode::NOT_FOUND => NOT_FOUND_PAGE_MSG,
                StatusCode::INTERNAL_SERVER_ERROR => SERVER_ERROR_PAGE_MSG,
                _ => return Ok(resp),
            };
            let page = page.unwrap_or_else(|| web::Data::new(ErrorPage::fallback()));
            let status = resp.status();
            let html = HttpResponse::build(status)
                .content_type(ContentType::html())
                .body(page.render(message));
            Ok(resp.into_response(html).map_into_right_body())
        }.boxed_local()
    }
}
