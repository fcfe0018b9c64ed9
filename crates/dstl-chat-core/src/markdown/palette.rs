use crate::models::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
    pub const GRAY_100: Rgb = Rgb(0xf3, 0xf4, 0xf6);
    pub const GRAY_300: Rgb = Rgb(0xd1, 0xd5, 0xdb);
    pub const GRAY_800: Rgb = Rgb(0x1f, 0x29, 0x37);
    pub const BLUE_100: Rgb = Rgb(0xdb, 0xea, 0xfe);
    pub const BLUE_300: Rgb = Rgb(0x93, 0xc5, 0xfd);
    pub const BLUE_400: Rgb = Rgb(0x60, 0xa5, 0xfa);
    pub const BLUE_500: Rgb = Rgb(0x3b, 0x82, 0xf6);
    pub const BLUE_600: Rgb = Rgb(0x25, 0x63, 0xeb);
}

/// Colours for one message bubble. Code, quote borders and links are tinted
/// so they keep contrast against the bubble background.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RolePalette {
    pub bubble_bg: Rgb,
    pub bubble_fg: Rgb,
    pub code_bg: Rgb,
    pub code_fg: Rgb,
    pub quote_border: Rgb,
    pub link: Rgb,
}

impl RolePalette {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::User => Self {
                bubble_bg: Rgb::BLUE_500,
                bubble_fg: Rgb::WHITE,
                code_bg: Rgb::BLUE_400,
                code_fg: Rgb::WHITE,
                quote_border: Rgb::BLUE_300,
                link: Rgb::BLUE_100,
            },
            Role::Assistant => Self {
                bubble_bg: Rgb::WHITE,
                bubble_fg: Rgb::GRAY_800,
                code_bg: Rgb::GRAY_100,
                code_fg: Rgb::GRAY_800,
                quote_border: Rgb::GRAY_300,
                link: Rgb::BLUE_600,
            },
        }
    }
}

/// How links in message bodies are opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkPolicy {
    pub new_context: bool,
    pub no_referrer: bool,
    pub no_opener: bool,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            new_context: true,
            no_referrer: true,
            no_opener: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_and_assistant_differ() {
        let user = RolePalette::for_role(Role::User);
        let assistant = RolePalette::for_role(Role::Assistant);
        assert_ne!(user.bubble_bg, assistant.bubble_bg);
        assert_ne!(user.quote_border, assistant.quote_border);
        assert_eq!(assistant.link, Rgb::BLUE_600);
    }
}
