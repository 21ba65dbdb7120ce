use leptos::{
    ev::{Event, SubmitEvent},
    prelude::*,
    task::spawn_local,
};
use leptos_use::{use_timeout_fn, UseTimeoutFnReturn};

use crate::contact::{
    Attempt, ContactForm, Field, FormFields, GatewayError, RelayGateway, RelayReply,
    RESET_DELAY_MS,
};

#[server]
pub async fn send_contact(fields: FormFields) -> Result<RelayReply, ServerFnError> {
    use crate::relay::HttpRelay;

    if let Err(err) = fields.validate() {
        tracing::info!(%err, "rejected contact submission");
        return Ok(RelayReply::rejected(err.to_string()));
    }

    let relay = use_context::<HttpRelay>()
        .ok_or_else(|| ServerFnError::new("Contact relay is not configured"))?;
    match relay.send(&fields).await {
        Ok(reply) => {
            if reply.success {
                tracing::info!("contact message relayed");
            } else {
                tracing::warn!(reason = ?reply.message, "contact relay refused message");
            }
            Ok(reply)
        }
        Err(err) => {
            tracing::error!(%err, "contact relay failed");
            Err(ServerFnError::new("Contact relay failed"))
        }
    }
}

/// Browser-side gateway: forwards through the `send_contact` server function
/// so relay credentials stay on the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerFnGateway;

impl RelayGateway for ServerFnGateway {
    async fn send(&self, fields: &FormFields) -> Result<RelayReply, GatewayError> {
        send_contact(fields.clone())
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))
    }
}

const INPUT_CLASS: &str = "w-full bg-transparent border-b-2 border-dotted border-muted/40 py-3 placeholder-muted focus:border-cyan focus:outline-none transition-colors disabled:opacity-50";

#[component]
pub fn ContactPanel() -> impl IntoView {
    let form = RwSignal::new(ContactForm::default());

    let liveness = form.with_untracked(|f| f.liveness());
    on_cleanup(move || liveness.end());

    let UseTimeoutFnReturn { start, stop, .. } = use_timeout_fn(
        move |_: ()| {
            form.try_update(|f| f.expire());
        },
        RESET_DELAY_MS as f64,
    );

    let sending = move || form.with(|f| f.state().is_sending());
    let value_of = move |field: Field| move || form.with(|f| f.fields().get(field).to_string());
    let on_input = move |field: Field| {
        move |ev: Event| {
            let value = event_target_value(&ev);
            form.update(|f| {
                f.update_field(field, value);
            });
        }
    };

    let on_clear = {
        let stop = stop.clone();
        move |_| {
            stop();
            form.update(|f| f.reset());
        }
    };

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        match form.try_update(|f| f.begin_submit()) {
            Some(Attempt::Send(dispatch)) => {
                stop();
                let start = start.clone();
                spawn_local(async move {
                    let result = ServerFnGateway.send(dispatch.fields()).await;
                    if !dispatch.is_live() {
                        log::debug!("contact panel gone before the relay answered");
                        return;
                    }
                    if form
                        .try_update(|f| f.complete(&dispatch, result))
                        .unwrap_or(false)
                    {
                        start(());
                    }
                });
            }
            Some(Attempt::Rejected(err)) => {
                log::info!("contact form rejected: {err}");
                start(());
            }
            Some(Attempt::InFlight) | None => {}
        }
    };

    view! {
        <form on:submit=on_submit class="space-y-6" novalidate=true>
            <div class="grid grid-cols-1 md:grid-cols-2 gap-6">
                <input
                    type="text"
                    name=Field::Name.as_str()
                    placeholder=Field::Name.placeholder()
                    class=INPUT_CLASS
                    prop:value=value_of(Field::Name)
                    on:input=on_input(Field::Name)
                    disabled=sending
                />
                <input
                    type="email"
                    name=Field::Email.as_str()
                    placeholder=Field::Email.placeholder()
                    class=INPUT_CLASS
                    prop:value=value_of(Field::Email)
                    on:input=on_input(Field::Email)
                    disabled=sending
                />
            </div>
            <input
                type="text"
                name=Field::Subject.as_str()
                placeholder=Field::Subject.placeholder()
                class=INPUT_CLASS
                prop:value=value_of(Field::Subject)
                on:input=on_input(Field::Subject)
                disabled=sending
            />
            <textarea
                name=Field::Message.as_str()
                placeholder=Field::Message.placeholder()
                rows=6
                class=format!("{INPUT_CLASS} resize-none")
                prop:value=value_of(Field::Message)
                on:input=on_input(Field::Message)
                disabled=sending
            ></textarea>
            <div class="flex flex-col sm:flex-row items-start sm:items-center gap-4">
                <button
                    type="submit"
                    disabled=sending
                    class="bg-cyan/20 hover:bg-cyan/30 text-cyan px-8 py-4 rounded-full font-semibold border border-cyan/30 transition-all duration-200 disabled:opacity-50 disabled:cursor-not-allowed"
                >
                    {move || if sending() { "Sending..." } else { "Send Message" }}
                </button>
                <button
                    type="button"
                    disabled=sending
                    on:click=on_clear
                    class="text-muted hover:text-foreground px-4 py-4 transition-colors duration-200 disabled:opacity-50"
                >
                    "Clear"
                </button>
                {move || {
                    form.with(|f| {
                        let state = f.state();
                        if !state.is_terminal() {
                            return None;
                        }
                        Some(match state.error_message() {
                            None => {
                                view! {
                                    <div class="text-green font-medium" role="status">
                                        "✔ Message sent successfully!"
                                    </div>
                                }
                                    .into_any()
                            }
                            Some(reason) => {
                                let reason = reason.to_string();
                                view! {
                                    <div class="text-red font-medium" role="alert">
                                        "✘ "
                                        {reason}
                                    </div>
                                }
                                    .into_any()
                            }
                        })
                    })
                }}
            </div>
        </form>
    }
}
