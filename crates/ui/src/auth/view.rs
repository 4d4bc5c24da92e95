use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, IndexPath, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
    label::Label,
    select::{Select, SelectState},
    skeleton::Skeleton,
    v_flex,
};
use gpui_tokio_bridge::Tokio;
use murmur_core::directory::{default_dial_code, fetch_countries};
use murmur_core::{AuthFlow, AuthStep, Country, Notice, PhoneField, VerifyOutcome};

use crate::model::AppModel;
use crate::settings::SettingsState;

const CARD_WIDTH: Pixels = px(400.);

/// Phone number and simulated OTP sign-in.
pub struct AuthView {
    app_model: Entity<AppModel>,
    settings_state: Entity<SettingsState>,
    flow: AuthFlow,
    countries: Vec<Country>,
    countries_loading: bool,
    country_select: Entity<SelectState<Vec<SharedString>>>,
    manual_code_input: Entity<InputState>,
    phone_input: Entity<InputState>,
    otp_input: Entity<InputState>,
    country_error: Option<SharedString>,
    phone_error: Option<SharedString>,
    otp_error: Option<SharedString>,
    directory_task: Option<Task<()>>,
    send_task: Option<Task<()>>,
    verify_task: Option<Task<()>>,
}

impl AuthView {
    pub fn new(
        app_model: Entity<AppModel>,
        settings_state: Entity<SettingsState>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let country_select =
            cx.new(|cx| SelectState::new(Vec::new(), None, window, cx).searchable(true));
        let manual_code_input =
            cx.new(|cx| InputState::new(window, cx).placeholder("Country code, e.g. +1"));
        let phone_input = cx.new(|cx| InputState::new(window, cx).placeholder("Phone number"));
        let otp_input = cx.new(|cx| InputState::new(window, cx).placeholder("6-digit code"));

        cx.subscribe_in(
            &phone_input,
            window,
            |this, _, event: &InputEvent, window, cx| {
                if let InputEvent::PressEnter { .. } = event {
                    this.send_otp(window, cx);
                }
            },
        )
        .detach();

        cx.subscribe_in(
            &otp_input,
            window,
            |this, _, event: &InputEvent, window, cx| {
                if let InputEvent::PressEnter { .. } = event {
                    this.verify_otp(window, cx);
                }
            },
        )
        .detach();

        let mut view = Self {
            app_model,
            settings_state,
            flow: AuthFlow::new(),
            countries: Vec::new(),
            countries_loading: true,
            country_select,
            manual_code_input,
            phone_input,
            otp_input,
            country_error: None,
            phone_error: None,
            otp_error: None,
            directory_task: None,
            send_task: None,
            verify_task: None,
        };
        view.load_countries(window, cx);
        view
    }

    fn load_countries(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let url = self
            .settings_state
            .read(cx)
            .settings()
            .country_directory_url
            .clone();
        let request = Tokio::spawn(cx, async move { fetch_countries(&url).await });

        self.countries_loading = true;
        self.directory_task = Some(cx.spawn_in(window, async move |this, cx| {
            let countries = match request.await {
                Ok(Ok(countries)) => Some(countries),
                Ok(Err(error)) => {
                    tracing::warn!("failed to load country directory: {error}");
                    None
                }
                Err(error) => {
                    tracing::warn!("country directory task failed: {error}");
                    None
                }
            };

            let _ = this.update_in(cx, |this, window, cx| {
                this.apply_countries(countries, window, cx);
            });
        }));
    }

    fn apply_countries(
        &mut self,
        countries: Option<Vec<Country>>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.countries_loading = false;
        self.directory_task = None;

        let Some(countries) = countries else {
            self.countries.clear();
            self.app_model.update(cx, |model, cx| {
                model.push_notice(Notice::warning("Failed to load country data."), cx);
            });
            cx.notify();
            return;
        };

        let labels: Vec<SharedString> = countries.iter().map(country_label).collect();
        let selected = default_dial_code(&countries)
            .and_then(|dial_code| {
                countries
                    .iter()
                    .position(|country| country.dial_code == dial_code)
            })
            .map(|index| IndexPath::default().row(index));

        self.country_select.update(cx, |select_state, cx| {
            select_state.set_items(labels, window, cx);
            select_state.set_selected_index(selected, window, cx);
        });
        self.countries = countries;
        cx.notify();
    }

    /// Dial code from the picker, or the typed one when the directory is unavailable.
    fn country_code(&self, cx: &App) -> String {
        if self.countries.is_empty() {
            return self.manual_code_input.read(cx).value().trim().to_string();
        }

        self.country_select
            .read(cx)
            .selected_value()
            .and_then(|label| {
                self.countries
                    .iter()
                    .find(|country| country_label(country) == *label)
            })
            .map(|country| country.dial_code.clone())
            .unwrap_or_default()
    }

    fn send_otp(&mut self, _window: &mut Window, cx: &mut Context<Self>) {
        if self.flow.is_sending() || self.flow.step() != AuthStep::CollectingPhone {
            return;
        }

        let country_code = self.country_code(cx);
        let phone_number = self.phone_input.read(cx).value().to_string();
        self.country_error = None;
        self.phone_error = None;

        if let Err((field, error)) = self.flow.begin_send(&country_code, &phone_number) {
            let message = Some(SharedString::from(error.to_string()));
            match field {
                PhoneField::CountryCode => self.country_error = message,
                PhoneField::PhoneNumber => self.phone_error = message,
            }
            cx.notify();
            return;
        }

        let delay = self.settings_state.read(cx).settings().timings.otp_send_delay();
        self.send_task = Some(cx.spawn(async move |this, cx| {
            cx.background_executor().timer(delay).await;

            let _ = this.update(cx, |this, cx| {
                this.send_task = None;
                this.flow.complete_send();
                this.flush_notices(cx);
                cx.notify();
            });
        }));
        cx.notify();
    }

    fn verify_otp(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if self.flow.is_verifying() || self.flow.step() != AuthStep::CollectingOtp {
            return;
        }

        let otp = self.otp_input.read(cx).value().trim().to_string();
        if let Err(error) = self.flow.begin_verify(&otp) {
            self.otp_error = Some(error.to_string().into());
            cx.notify();
            return;
        }
        self.otp_error = None;
        self.flush_notices(cx);

        let delay = self
            .settings_state
            .read(cx)
            .settings()
            .timings
            .otp_verify_delay();
        self.verify_task = Some(cx.spawn_in(window, async move |this, cx| {
            cx.background_executor().timer(delay).await;

            let _ = this.update_in(cx, |this, window, cx| {
                this.verify_task = None;
                let outcome = this.flow.finish_verify(&otp);
                this.flush_notices(cx);
                if let VerifyOutcome::Verified { identity } = outcome {
                    this.reset_inputs(window, cx);
                    this.app_model
                        .update(cx, |model, cx| model.login(identity, cx));
                }
                cx.notify();
            });
        }));
        cx.notify();
    }

    fn back(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.send_task = None;
        self.verify_task = None;
        self.flow.back();
        self.otp_error = None;
        self.otp_input.update(cx, |state, cx| {
            state.set_value("", window, cx);
        });
        cx.notify();
    }

    fn reset_inputs(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        for input in [&self.phone_input, &self.otp_input] {
            input.update(cx, |state, cx| {
                state.set_value("", window, cx);
            });
        }
        self.country_error = None;
        self.phone_error = None;
        self.otp_error = None;
    }

    fn flush_notices(&mut self, cx: &mut Context<Self>) {
        let notices = self.flow.take_notices();
        if notices.is_empty() {
            return;
        }

        self.app_model.update(cx, |model, cx| {
            for notice in notices {
                model.push_notice(notice, cx);
            }
        });
    }

    fn render_field(
        &self,
        label: &'static str,
        field: AnyElement,
        error: Option<SharedString>,
        cx: &Context<Self>,
    ) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .gap_1()
            .child(
                Label::new(label)
                    .text_sm()
                    .text_color(theme.foreground),
            )
            .child(field)
            .when_some(error, |column, error| {
                column.child(Label::new(error).text_xs().text_color(theme.danger))
            })
    }

    fn render_country_field(&self) -> AnyElement {
        if self.countries_loading {
            return Skeleton::new()
                .w_full()
                .h(px(32.))
                .rounded_md()
                .into_any_element();
        }

        if self.countries.is_empty() {
            return Input::new(&self.manual_code_input)
                .w_full()
                .into_any_element();
        }

        Select::new(&self.country_select)
            .w_full()
            .placeholder("Select country")
            .search_placeholder("Search country")
            .into_any_element()
    }

    fn render_phone_step(&self, cx: &Context<Self>) -> impl IntoElement {
        let sending = self.flow.is_sending();

        v_flex()
            .gap_4()
            .child(self.render_field(
                "Country Code",
                self.render_country_field(),
                self.country_error.clone(),
                cx,
            ))
            .child(self.render_field(
                "Phone Number",
                Input::new(&self.phone_input).w_full().into_any_element(),
                self.phone_error.clone(),
                cx,
            ))
            .child(
                Button::new("send-otp")
                    .primary()
                    .w_full()
                    .loading(sending)
                    .child(if sending { "Sending OTP..." } else { "Send OTP" })
                    .on_click(cx.listener(|this, _, window, cx| {
                        this.send_otp(window, cx);
                    })),
            )
    }

    fn render_otp_step(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let verifying = self.flow.is_verifying();
        let code = self.flow.simulated_code().unwrap_or_default().to_string();

        v_flex()
            .gap_4()
            .child(
                div()
                    .id("simulated-otp")
                    .px_3()
                    .py_2()
                    .rounded_md()
                    .bg(theme.muted)
                    .child(
                        Label::new(format!("Simulated OTP: {code}"))
                            .text_sm()
                            .text_color(theme.muted_foreground),
                    ),
            )
            .child(self.render_field(
                "Enter OTP",
                Input::new(&self.otp_input).w_full().into_any_element(),
                self.otp_error.clone(),
                cx,
            ))
            .child(
                h_flex()
                    .gap_2()
                    .child(
                        Button::new("otp-back")
                            .ghost()
                            .icon(IconName::ArrowLeft)
                            .child("Back")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.back(window, cx);
                            })),
                    )
                    .child(
                        Button::new("verify-otp")
                            .primary()
                            .flex_1()
                            .loading(verifying)
                            .child(if verifying { "Verifying..." } else { "Verify OTP" })
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.verify_otp(window, cx);
                            })),
                    ),
            )
    }
}

impl Render for AuthView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let step = self.flow.step();

        v_flex()
            .id("auth-view")
            .size_full()
            .items_center()
            .justify_center()
            .bg(theme.background)
            .child(
                v_flex()
                    .w(CARD_WIDTH)
                    .gap_6()
                    .p_6()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.background)
                    .child(
                        v_flex()
                            .gap_1()
                            .items_center()
                            .child(Label::new("Welcome to Gemini Chat").text_xl())
                            .child(
                                Label::new(match step {
                                    AuthStep::CollectingPhone => {
                                        "Enter your phone number to get started"
                                    }
                                    AuthStep::CollectingOtp => {
                                        "Enter the code we sent to your phone"
                                    }
                                })
                                .text_sm()
                                .text_color(theme.muted_foreground),
                            ),
                    )
                    .map(|card| match step {
                        AuthStep::CollectingPhone => card.child(self.render_phone_step(cx)),
                        AuthStep::CollectingOtp => card.child(self.render_otp_step(cx)),
                    }),
            )
    }
}

fn country_label(country: &Country) -> SharedString {
    format!("{} ({})", country.name, country.dial_code).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[::core::prelude::v1::test]
    fn country_labels_show_name_and_dial_code() {
        let country = Country {
            name: "India".to_string(),
            code: "IN".to_string(),
            dial_code: "+91".to_string(),
        };
        assert_eq!(country_label(&country).as_ref(), "India (+91)");
    }
}
