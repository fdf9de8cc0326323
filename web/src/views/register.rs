use dioxus::prelude::*;

use crate::Route;

#[component]
pub fn Register(error: Option<String>) -> Element {
    rsx! {
        div { class: "login-page",
            div { class: "login-card",
                div { class: "login-header",
                    h1 { class: "login-title", "CabDesk" }
                    p { class: "login-subtitle", "Create an administrator account" }
                }
                if let Some(error) = error {
                    div { class: "alert alert-error", "{error}" }
                }
                form {
                    action: "/auth/register",
                    method: "post",
                    div { class: "form-group",
                        label { class: "form-label", r#for: "name", "Name" }
                        input { id: "name", name: "name", class: "form-input", r#type: "text", required: true }
                    }
                    div { class: "form-group",
                        label { class: "form-label", r#for: "email", "Email" }
                        input {
                            id: "email",
                            name: "email",
                            class: "form-input",
                            r#type: "email",
                            autocomplete: "username",
                            required: true,
                        }
                    }
                    div { class: "form-group",
                        label { class: "form-label", r#for: "password", "Password" }
                        input {
                            id: "password",
                            name: "password",
                            class: "form-input",
                            r#type: "password",
                            autocomplete: "new-password",
                            minlength: "8",
                            required: true,
                        }
                    }
                    div { class: "form-group",
                        label { class: "form-label", r#for: "confirm", "Confirm password" }
                        input {
                            id: "confirm",
                            name: "confirm",
                            class: "form-input",
                            r#type: "password",
                            autocomplete: "new-password",
                            required: true,
                        }
                    }
                    button {
                        r#type: "submit",
                        class: "btn btn-primary login-btn",
                        "Register"
                    }
                }
                p { class: "login-footer text-muted",
                    "Already registered? "
                    Link { to: Route::Login { error: None }, "Sign in" }
                }
            }
        }
    }
}
