use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::i18n::Lang;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    VerificationCode,
    PasswordReset,
}

struct Wording {
    greeting: &'static str,
    intro: &'static str,
    button: &'static str,
    outro: &'static str,
}

fn wording(kind: Kind, lang: Lang) -> Wording {
    match (kind, lang) {
        (Kind::VerificationCode, Lang::En) => Wording {
            greeting: "Hi",
            intro: "Thanks for creating an account. Please verify your email address by following this link:",
            button: "Verify your account",
            outro: "If you did not create an account, you can safely ignore this email.",
        },
        (Kind::VerificationCode, Lang::Fr) => Wording {
            greeting: "Bonjour",
            intro: "Merci d'avoir créé un compte. Veuillez confirmer votre adresse email en suivant ce lien :",
            button: "Vérifier votre compte",
            outro: "Si vous n'avez pas créé de compte, vous pouvez ignorer cet email.",
        },
        (Kind::PasswordReset, Lang::En) => Wording {
            greeting: "Hi",
            intro: "Forgot your password? Follow this link to choose a new one. It is valid for only 10 minutes:",
            button: "Reset your password",
            outro: "If you didn't forget your password, please ignore this email.",
        },
        (Kind::PasswordReset, Lang::Fr) => Wording {
            greeting: "Bonjour",
            intro: "Mot de passe oublié ? Suivez ce lien pour en choisir un nouveau. Il n'est valable que 10 minutes :",
            button: "Réinitialiser votre mot de passe",
            outro: "Si vous n'avez pas oublié votre mot de passe, ignorez cet email.",
        },
    }
}

/// Returns `(html, text)` bodies. The link sits on its own line in the text
/// version.
pub fn render(kind: Kind, lang: Lang, name: &str, subject: &str, url: &str) -> (String, String) {
    let c = wording(kind, lang);

    let text = format!(
        "{greeting} {name},\n\n{intro}\n\n{url}\n\n{outro}\n",
        greeting = c.greeting,
        intro = c.intro,
        outro = c.outro,
    );

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{subject}</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <p>{greeting} {name},</p>
    <p>{intro}</p>
    <p style="text-align: center;">
        <a href="{href}" style="display: inline-block; padding: 12px 24px; background-color: #2c3e50; color: #ffffff; text-decoration: none; border-radius: 4px;">{button}</a>
    </p>
    <p style="word-break: break-all;">{url_text}</p>
    <p>{outro}</p>
    <p>Tournament</p>
</body>
</html>"#,
        lang = lang.as_str(),
        subject = encode_text(subject),
        greeting = c.greeting,
        name = encode_text(name),
        intro = encode_text(c.intro),
        href = encode_double_quoted_attribute(url),
        button = c.button,
        url_text = encode_text(url),
        outro = encode_text(c.outro),
    );

    (html, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_supplied_name_is_escaped_in_html() {
        let (html, text) = render(
            Kind::VerificationCode,
            Lang::En,
            "<script>",
            "Your account activation code",
            "https://app.test/verify-email/abc",
        );
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(text.starts_with("Hi <script>,"));
    }

    #[test]
    fn link_is_on_its_own_line() {
        let url = "https://app.test/reset-password/xyz";
        let (html, text) = render(Kind::PasswordReset, Lang::Fr, "Ana", "Sujet", url);
        assert!(text.lines().any(|l| l == url));
        assert!(html.contains(&format!("href=\"{url}\"")));
        assert!(html.contains("lang=\"fr\""));
    }
}
