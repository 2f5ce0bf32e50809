//! Text-Safety Transform.
//!
//! Model output is untrusted. [`render`] escapes it completely before
//! any markup is generated, then turns links into anchors in three passes:
//! explicit `http(s)://` URLs (an `@` sigil in front is dropped), bare
//! `www.` hosts, and email addresses. Each pass only sees text that no
//! earlier pass has linked, so anchors never nest.

use regex_lite::Regex;
use std::sync::LazyLock;

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@?https?://\S+").expect("url pattern"));
// Only at the start of a word: `bob@www.x.test` is an email and
// `foo.www.x.test` is not a host.
static WWW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s(])(www\.\S+)").expect("www pattern"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}")
        .expect("email pattern")
});

/// Escaped entities that end a link: they stand for characters that
/// cannot appear unencoded in a URL.
const LINK_TERMINATORS: &[&str] = &["&lt;", "&gt;", "&quot;", "&#39;"];

/// Punctuation trimmed from the end of a link.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}'];

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render raw text as safe markup with clickable links.
pub fn render(raw: &str) -> String {
    let mut segments = vec![Segment::Plain(escape_html(raw))];

    segments = link_pass(segments, &URL, |token| {
        let url = token.strip_prefix('@').unwrap_or(token);
        (url.to_string(), url.to_string())
    });
    segments = link_pass(segments, &WWW, |host| (format!("https://{host}"), host.to_string()));
    segments = link_pass(segments, &EMAIL, |addr| (format!("mailto:{addr}"), addr.to_string()));

    segments.iter().map(Segment::to_markup).collect()
}

enum Segment {
    Plain(String),
    Link { href: String, text: String },
}

impl Segment {
    fn to_markup(&self) -> String {
        match self {
            Self::Plain(text) => text.clone(),
            Self::Link { href, text } => {
                format!(r#"<a href="{href}" target="_blank" rel="noopener noreferrer">{text}</a>"#)
            }
        }
    }
}

/// Run one pattern over the plain segments. The link is capture group 1
/// when the pattern has one, the whole match otherwise. `make` maps the
/// link token to `(href, visible text)`.
fn link_pass(
    segments: Vec<Segment>,
    re: &Regex,
    make: impl Fn(&str) -> (String, String),
) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        let Segment::Plain(text) = segment else {
            out.push(segment);
            continue;
        };

        let mut plain_start = 0;
        let mut pos = 0;
        while let Some(caps) = re.captures_at(&text, pos) {
            let Some(m) = caps.get(1).or_else(|| caps.get(0)) else {
                break;
            };
            let token = clean_token(m.as_str());
            if !has_body(token) {
                pos = m.end();
                continue;
            }

            if m.start() > plain_start {
                out.push(Segment::Plain(text[plain_start..m.start()].to_string()));
            }
            let (href, visible) = make(token);
            out.push(Segment::Link {
                href,
                text: visible,
            });
            plain_start = m.start() + token.len();
            pos = plain_start;
        }
        if plain_start < text.len() {
            out.push(Segment::Plain(text[plain_start..].to_string()));
        }
    }
    out
}

/// Cut a match at the first escaped terminator and trim trailing punctuation.
fn clean_token(matched: &str) -> &str {
    let cut = LINK_TERMINATORS
        .iter()
        .filter_map(|entity| matched.find(entity))
        .min()
        .unwrap_or(matched.len());
    let mut token = &matched[..cut];

    while let Some(last) = token.chars().last() {
        if !TRAILING_PUNCTUATION.contains(&last) || (last == ';' && token.ends_with("&amp;")) {
            break;
        }
        token = &token[..token.len() - last.len_utf8()];
    }
    token
}

/// A link needs something after its scheme or prefix.
fn has_body(token: &str) -> bool {
    let rest = token
        .trim_start_matches('@')
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");
    !rest.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(href: &str, text: &str) -> String {
        format!(r#"<a href="{href}" target="_blank" rel="noopener noreferrer">{text}</a>"#)
    }

    #[test]
    fn escapes_all_five_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn script_tags_never_survive() {
        let out = render("<script>alert('x')</script> see https://evil.example.test/<script>");
        assert!(!out.contains("<script>"));
        assert!(out.contains("&lt;script&gt;"));
        assert!(out.contains(&anchor(
            "https://evil.example.test/",
            "https://evil.example.test/"
        )));
    }

    #[test]
    fn plain_text_is_only_escaped() {
        assert_eq!(render("No links here, 2 < 3."), "No links here, 2 &lt; 3.");
    }

    #[test]
    fn links_explicit_urls() {
        assert_eq!(
            render("Visit https://acme.example.test/help."),
            format!(
                "Visit {}.",
                anchor("https://acme.example.test/help", "https://acme.example.test/help")
            )
        );
    }

    #[test]
    fn drops_at_sigil() {
        assert_eq!(
            render("@https://acme.example.test"),
            anchor("https://acme.example.test", "https://acme.example.test")
        );
    }

    #[test]
    fn query_strings_keep_escaped_ampersand() {
        let out = render("https://acme.example.test/?a=1&b=2");
        assert_eq!(
            out,
            anchor(
                "https://acme.example.test/?a=1&amp;b=2",
                "https://acme.example.test/?a=1&amp;b=2"
            )
        );
    }

    #[test]
    fn www_hosts_get_secure_scheme() {
        assert_eq!(
            render("Try www.acme.example.test, it works"),
            format!(
                "Try {}, it works",
                anchor("https://www.acme.example.test", "www.acme.example.test")
            )
        );
    }

    #[test]
    fn www_inside_url_is_not_linked_twice() {
        let out = render("https://www.acme.example.test/faq");
        assert_eq!(out.matches("<a ").count(), 1);
        assert!(!out.contains("https://https://"));
    }

    #[test]
    fn emails_become_mailto() {
        assert_eq!(
            render("Mail help@acme.example.test today"),
            format!(
                "Mail {} today",
                anchor("mailto:help@acme.example.test", "help@acme.example.test")
            )
        );
    }

    #[test]
    fn url_with_email_like_path_links_once() {
        let out = render("https://acme.example.test/u/bob@acme.example.test");
        assert_eq!(out.matches("<a ").count(), 1);
        assert!(!out.contains("mailto:"));
    }

    #[test]
    fn quotes_cannot_break_out_of_href() {
        let out = render(r#"https://acme.example.test/"onmouseover="x"#);
        assert!(!out.contains(r#"" onmouseover"#));
        assert!(out.starts_with(&anchor(
            "https://acme.example.test/",
            "https://acme.example.test/"
        )));
    }

    #[test]
    fn bare_scheme_is_not_a_link() {
        assert_eq!(render("https://"), "https://");
        assert_eq!(render("www."), "www.");
    }

    #[test]
    fn patterns_compile() {
        for re in [&URL, &WWW, &EMAIL] {
            LazyLock::force(re);
        }
    }

    #[test]
    fn email_on_www_domain_is_mailto() {
        assert_eq!(
            render("mail bob@www.example.test now"),
            format!(
                "mail {} now",
                anchor("mailto:bob@www.example.test", "bob@www.example.test")
            )
        );
    }

    #[test]
    fn www_inside_a_word_is_not_a_host() {
        assert_eq!(render("foo.www.bar.test"), "foo.www.bar.test");
    }

    #[test]
    fn www_in_parentheses_links() {
        assert_eq!(
            render("(www.acme.example.test)"),
            format!("({})", anchor("https://www.acme.example.test", "www.acme.example.test"))
        );
    }

    #[test]
    fn several_links_in_order() {
        let out = render("a https://one.example.test b www.two.example.test c x@three.example.test");
        let first = out.find("one.example.test").unwrap();
        let second = out.find("two.example.test").unwrap();
        let third = out.find("three.example.test").unwrap();
        assert!(first < second && second < third);
        assert_eq!(out.matches("<a ").count(), 3);
    }
}
