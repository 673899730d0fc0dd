//! Static page content.
//!
//! Everything the page shows is literal data: the navigation links, the
//! section order, the transmission-route table, tips and response actions.
//! Both the HTML renderer and the terminal renderer read from here.

use chrono::Datelike;

/// Page title, also used as the hero heading.
pub const TITLE: &str = "Хүн, малын гоц халдварт өвчин";

/// Short description used for the `<meta name="description">` tag.
pub const DESCRIPTION: &str = "Хүн, амьтны халдварт өвчнийг оношлох, эмчлэх эх сурвалж.";

pub const HERO_SUBTITLE: &str =
    "Дэгдэлтийг ойлгох, урьдчилан сэргийлэх, хариу арга хэмжээ авах гарын авлага.";

/// Document-order identifiers of every section on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Hero,
    Understanding,
    Information,
    Prevention,
    Video,
    Actions,
    Call,
    Quote,
    Footer,
}

impl SectionId {
    /// All sections in the order they appear in the document.
    pub const ALL: [SectionId; 9] = [
        SectionId::Hero,
        SectionId::Understanding,
        SectionId::Information,
        SectionId::Prevention,
        SectionId::Video,
        SectionId::Actions,
        SectionId::Call,
        SectionId::Quote,
        SectionId::Footer,
    ];

    /// The anchor id, without the leading `#`.
    pub fn anchor(self) -> &'static str {
        match self {
            SectionId::Hero => "hero",
            SectionId::Understanding => "understanding",
            SectionId::Information => "information",
            SectionId::Prevention => "prevention",
            SectionId::Video => "video",
            SectionId::Actions => "actions",
            SectionId::Call => "call",
            SectionId::Quote => "quote",
            SectionId::Footer => "footer",
        }
    }

    /// Resolve an anchor (with or without a leading `#`) to a section.
    pub fn from_anchor(anchor: &str) -> Option<SectionId> {
        let id = anchor.strip_prefix('#').unwrap_or(anchor);
        SectionId::ALL.into_iter().find(|s| s.anchor() == id)
    }
}

/// One entry of the header navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub target: SectionId,
    pub label: &'static str,
    /// English tooltip carried by the link.
    pub title: &'static str,
}

pub const NAV_LINKS: [NavLink; 4] = [
    NavLink {
        target: SectionId::Hero,
        label: "🏠 Нүүр",
        title: "Home",
    },
    NavLink {
        target: SectionId::Understanding,
        label: "ℹ️ Ойлголт",
        title: "Understanding",
    },
    NavLink {
        target: SectionId::Prevention,
        label: "🛡️ Урьдчилан Сэргийлэх",
        title: "Prevention",
    },
    NavLink {
        target: SectionId::Actions,
        label: "🚀 Авах арга хэмжээ",
        title: "Actions",
    },
];

pub const UNDERSTANDING_HEADING: &str = "Халдварт өвчний талаар";

pub const UNDERSTANDING_TEXT: &str = "\"Хүн, мал амьтны гоц халдварт өвчин\" гэж олон улсын хил хязгаараас үл хамааран богино хугацаанд хурдан тархаж хүн, малын эрүүл мэндэд хохирол учруулж, үндэсний аюулгүй байдалд сөргөөр нөлөөлөх халдварт өвчнийг хэлнэ. Тухайлбал түгээмэл тархсан малын гоц халдварт өвчин болох бруцеллёз, шүлхий зэрэг нь эрүүл мэнд, эдийн засагт томоохон хямрал үүсгэдэг бөгөөд мал аж ахуй нь Монголын эдийн засгийн тулгуур баганын нэг юм.";

/// An image loaded by path from the static directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticImage {
    pub path: &'static str,
    pub alt: &'static str,
}

pub const TRANSMISSION_IMAGE: StaticImage = StaticImage {
    path: "/images/image.png",
    alt: "Zoonotic Disease Transmission Cycle",
};

pub const LOGO_IMAGE: StaticImage = StaticImage {
    path: "/images/MUST-logo.png",
    alt: "Logo",
};

pub const INFORMATION_HEADING: &str = "Халдварлах зам ба Өвчний төрөл";

/// Column headers of the transmission table.
pub const TABLE_HEADERS: [&str; 3] = ["#", "Халдварлах зам", "Өвчний Төрөл"];

/// One row of the transmission-route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionRoute {
    pub id: u8,
    pub path: &'static str,
    pub diseases: &'static str,
}

pub const TRANSMISSION_ROUTES: [TransmissionRoute; 4] = [
    TransmissionRoute {
        id: 1,
        path: "Тэжээл боловсруулах замаар",
        diseases: "Боом, дуут хавдар, сүрьеэ, бруцеллёз, шүлхий, ям, сахуу, иж балнадын гаралтай хээл хаялт, адууны халдварт цус багадах, үхэр, гахайн мялзан, нохойн гудрага, гахайн ёлом",
    },
    TransmissionRoute {
        id: 2,
        path: "Амьсгалын замаар",
        diseases: "Сүрьеэ, цэцэг, сахуу, уушги-гялтангийн халдварт үрэвсэл, адууны амьсгалын дээд замын халдварт салслалт, үхрийн цээж, цусан халдвар, гахайн инфлюэнц, нохойн галзуу",
    },
    TransmissionRoute {
        id: 3,
        path: "Шээс-бэлгийн замаар",
        diseases: "Үтрээний үрэвсэл, бруцеллёз, адууны инфлюэнц",
    },
    TransmissionRoute {
        id: 4,
        path: "Арьс, салст бүрхэвч",
        diseases: "Боом, дуут хавдар, хорт хаван, зогсоо, садраг, ям, цэцэг, цахлай, галзуу, хулганын яр, адууны халдварт цус багасах өвчин",
    },
];

pub const PREVENTION_HEADING: &str = "Урьдчилан Сэргийлэлт ба Бэлтгэл";

/// Marker rendered in front of every prevention tip.
pub const TIP_MARKER: &str = "✔️";

pub const PREVENTION_TIPS: [&str; 6] = [
    "Гэртээ тэжээвэр амьтан, малыг вакцинжуулах.",
    "Сэжигтэй мал, амьтанд ойртохоос зайлсхийх.",
    "Амьтантай харьцсаны дараа гараа угаах.",
    "Холбогдох байгууллагаас зөвлөгөө авах.",
    "ХӨСҮТ/ЗӨСҮТ-аас мэдээллийг тогтмол авах.",
    "Маск, бээлий, ариутгагч хэрэгслийг нөөцлөх.",
];

/// Label of the button linking to the external prevention guide.
pub const MORE_INFO_LABEL: &str = "Дэлгэрэнгүй";

pub const VIDEO_HEADING: &str = "Видео Мэдээлэл";
pub const VIDEO_TITLE: &str = "YouTube video player";

pub const ACTIONS_HEADING: &str = "Авах хариу арга хэмжээ";

/// Marker rendered in front of every response action.
pub const ACTION_MARKER: &str = "→";

/// A titled list of response actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionGroup {
    pub title: &'static str,
    pub items: [&'static str; 3],
}

pub const ACTION_GROUPS: [ActionGroup; 2] = [
    ActionGroup {
        title: "Дэгдэлтийн Үед",
        items: [
            "Өвчтөнийг яаралтай тусгаарлах.",
            "Хамгаалалтын хэрэгсэл зүүх.",
            "Холбогдох байгууллагад хандах.",
        ],
    },
    ActionGroup {
        title: "Дэгдэлтийн Дараа",
        items: [
            "Бүрэн халдваргүйжүүлэх.",
            "Тархалтыг хянах.",
            "Нийтэд сургалт, семинарыг зохион байгуулах.",
        ],
    },
];

pub const CALL_HEADING: &str = "Яаралтай Тусламжийн Дугаар";
pub const CALL_ICON: &str = "🚨";

/// Label of the emergency call button for `number`.
pub fn call_label(number: &str) -> String {
    format!("{number} Залгах")
}

pub const QUOTE_TEXT: &str = "\"Хүн бүр эрүүл, аюулгүй байх болтугай.\"";
pub const QUOTE_ATTRIBUTION: &str = "ШУТИС МХТС-ийн оюутнуудаас...";

/// Footer copyright line for `year`.
pub fn footer_text(year: i32) -> String {
    format!("© {year} он. Зохиогчийн эрх хуулиар хамгаалав.")
}

/// Footer copyright line for the current local year.
pub fn current_footer_text() -> String {
    footer_text(chrono::Local::now().year())
}
