pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::refresh),
    )
    .service(
        web::scope("/tasks")
            // Literal paths must be registered before the `{id}` routes.
            .service(tasks::my_tasks)
            .service(tasks::assigned_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task_comments)
            .service(tasks::add_task_comment)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
