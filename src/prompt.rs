use dialoguer::{theme::ColorfulTheme, Input, Password};
use once_cell::sync::Lazy;
use std::io;

static THEME: Lazy<ColorfulTheme> = Lazy::new(ColorfulTheme::default);

pub(crate) fn text(prompt: &str) -> io::Result<String> {
    Input::<String>::with_theme(&*THEME)
        .with_prompt(prompt)
        .interact_text()
}

pub(crate) fn secret(prompt: &str) -> io::Result<String> {
    Password::with_theme(&*THEME)
        .with_prompt(prompt)
        .interact()
}
