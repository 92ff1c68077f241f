//! Shop, music and character customization catalogs.
//!
//! Shop items and music tracks are stored in the database and seeded from
//! the defaults below when their tables are empty. Customization items are
//! a fixed table addressed as `<kind>_<id>` (for example `skin_artist`).

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub item_id: String,
    pub name_tr: String,
    pub name_en: String,
    pub description_tr: String,
    pub description_en: String,
    pub price: i64,
    pub category: String,
    pub image_url: String,
    pub unlock_level: i64,
    /// Derived per request from the caller's level.
    #[serde(default)]
    pub locked: bool,
}

impl ShopItem {
    pub fn with_lock_for(mut self, level: i64) -> Self {
        self.locked = self.unlock_level > level;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicTrack {
    pub track_id: String,
    pub name: String,
    pub artist: String,
    pub url: String,
    pub category: String,
    pub unlock_level: i64,
    #[serde(default)]
    pub locked: bool,
}

impl MusicTrack {
    pub fn with_lock_for(mut self, level: i64) -> Self {
        self.locked = self.unlock_level > level;
        self
    }
}

/// Why a shop purchase may not go ahead.
pub fn check_purchase(item: &ShopItem, level: i64, credits: i64) -> Result<()> {
    if item.unlock_level > level {
        return Err(CoreError::Locked("Item locked - level too low".into()));
    }
    if credits < item.price {
        return Err(CoreError::invalid("Not enough credits"));
    }
    Ok(())
}

/// Appends `item_id` unless it is already owned.
pub fn add_owned(owned: &mut Vec<String>, item_id: &str) -> bool {
    if owned.iter().any(|i| i == item_id) {
        return false;
    }
    owned.push(item_id.to_string());
    true
}

#[allow(clippy::too_many_arguments)]
fn shop_item(
    item_id: &str,
    name_tr: &str,
    name_en: &str,
    description_tr: &str,
    description_en: &str,
    price: i64,
    category: &str,
    image: &str,
    unlock_level: i64,
) -> ShopItem {
    let folder = if category == "drinks" { "drinks" } else { "desserts" };
    ShopItem {
        item_id: item_id.to_string(),
        name_tr: name_tr.to_string(),
        name_en: name_en.to_string(),
        description_tr: description_tr.to_string(),
        description_en: description_en.to_string(),
        price,
        category: category.to_string(),
        image_url: format!("/assets/{folder}/{image}"),
        unlock_level,
        locked: false,
    }
}

pub fn default_shop_items() -> Vec<ShopItem> {
    vec![
        shop_item("latte", "Sıcak Latte", "Hot Latte", "Kremsi ve sıcacık", "Creamy and warm", 30, "drinks", "latte.jpg", 1),
        shop_item("cappuccino", "Cappuccino", "Cappuccino", "Köpüklü kahve keyfi", "Foamy coffee delight", 35, "drinks", "cappuccino.jpg", 1),
        shop_item("mocha", "Mocha", "Mocha", "Çikolatalı keyif", "Chocolate delight", 40, "drinks", "mocha.jpg", 1),
        shop_item("matcha", "Matcha Latte", "Matcha Latte", "Yeşil çay enerjisi", "Green tea energy", 35, "drinks", "matcha.jpg", 3),
        shop_item("hot_chocolate", "Sıcak Çikolata", "Hot Chocolate", "Tatlı sıcaklık", "Sweet warmth", 30, "drinks", "hot-chocolate.jpg", 1),
        shop_item("chai_latte", "Chai Latte", "Chai Latte", "Baharatlı sıcaklık", "Spiced warmth", 35, "drinks", "chai-latte.jpg", 4),
        shop_item("espresso", "Espresso", "Espresso", "Yoğun enerji", "Intense energy", 25, "drinks", "espresso.jpg", 2),
        shop_item("caramel_latte", "Karamelli Latte", "Caramel Latte", "Tatlı karamel tadı", "Sweet caramel taste", 40, "drinks", "caramel-latte.jpg", 5),
        shop_item("strawberry_smoothie", "Çilekli Smoothie", "Strawberry Smoothie", "Ferahlatıcı meyve", "Refreshing fruit", 45, "drinks", "strawberry-smoothie.jpg", 4),
        shop_item("lemonade", "Limonata", "Lemonade", "Serinletici", "Cooling refreshment", 25, "drinks", "lemonade.jpg", 2),
        shop_item("croissant", "Kruvasan", "Croissant", "Tereyağlı lezzet", "Buttery delight", 30, "treats", "croissant.jpg", 1),
        shop_item("blueberry_donut", "Yaban Mersinli Donut", "Blueberry Donut", "Meyveli tatlı", "Fruity sweetness", 25, "treats", "blueberry-donut.jpg", 1),
        shop_item("strawberry_donut", "Çilekli Donut", "Strawberry Donut", "Tatlı bir mola", "A sweet break", 25, "treats", "strawberry-donut.jpg", 1),
        shop_item("cupcake", "Cupcake", "Cupcake", "Minik mutluluk", "Tiny happiness", 30, "treats", "cupcake.jpg", 1),
        shop_item("macaron", "Makaron", "Macaron", "Fransız şıklığı", "French elegance", 35, "treats", "macaron.jpg", 3),
        shop_item("chocolate_cake", "Çikolatalı Pasta", "Chocolate Cake", "Çikolata cenneti", "Chocolate heaven", 50, "treats", "chocolate-cake.jpg", 5),
        shop_item("cheesecake", "Cheesecake Brownie", "Cheesecake Brownie", "Kremsi lezzet", "Creamy delight", 45, "treats", "cheesecake-brownie.jpg", 4),
        shop_item("ice_cream", "Dondurma", "Ice Cream", "Serinletici tatlı", "Cool sweetness", 30, "treats", "ice-cream.jpg", 2),
        shop_item("profiterole", "Profiterol", "Profiterole", "Çikolatalı şölen", "Chocolate feast", 55, "treats", "profiterole.jpg", 6),
        shop_item("creme_brulee", "Krem Brûlée", "Crème Brûlée", "Karamelize lezzet", "Caramelized delight", 50, "treats", "Creme-Brulee.jpg", 5),
    ]
}

fn track(id: &str, name: &str, artist: &str, song: u8, category: &str, unlock_level: i64) -> MusicTrack {
    MusicTrack {
        track_id: id.to_string(),
        name: name.to_string(),
        artist: artist.to_string(),
        url: format!("https://www.soundhelix.com/examples/mp3/SoundHelix-Song-{song}.mp3"),
        category: category.to_string(),
        unlock_level,
        locked: false,
    }
}

pub fn default_music_tracks() -> Vec<MusicTrack> {
    vec![
        track("lofi_chill", "Cozy Cafe Vibes", "LoFi Dreams", 1, "lofi", 1),
        track("ambient_rain", "Rainy Day Study", "Ambient Sounds", 2, "ambient", 1),
        track("piano_soft", "Soft Piano Dreams", "Classical Focus", 3, "classical", 1),
        track("nature_forest", "Forest Whispers", "Nature Sounds", 4, "nature", 3),
        track("jazz_smooth", "Midnight Jazz", "Jazz Cafe", 5, "jazz", 5),
        track("electronic_focus", "Deep Focus Electronic", "Focus Beats", 6, "electronic", 7),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomizationKind {
    Skin,
    Outfit,
    Accessory,
}

impl CustomizationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomizationKind::Skin => "skin",
            CustomizationKind::Outfit => "outfit",
            CustomizationKind::Accessory => "accessory",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CustomizationItem {
    pub kind: CustomizationKind,
    pub id: &'static str,
    pub emoji: &'static str,
    pub name_tr: &'static str,
    pub name_en: &'static str,
    pub price: i64,
    pub premium: bool,
}

impl CustomizationItem {
    /// Catalog key as stored in the owned list, e.g. `outfit_hoodie`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.kind.as_str(), self.id)
    }

    /// Free non-premium items are owned by everyone.
    pub fn is_default(&self) -> bool {
        self.price == 0 && !self.premium
    }
}

macro_rules! custom {
    ($kind:ident, $id:literal, $emoji:literal, $tr:literal, $en:literal, $price:literal, $premium:literal) => {
        CustomizationItem {
            kind: CustomizationKind::$kind,
            id: $id,
            emoji: $emoji,
            name_tr: $tr,
            name_en: $en,
            price: $price,
            premium: $premium,
        }
    };
}

pub const CUSTOMIZATION_ITEMS: &[CustomizationItem] = &[
    custom!(Skin, "default", "👤", "Varsayılan", "Default", 0, false),
    custom!(Skin, "student_girl", "👩‍🎓", "Öğrenci Kız", "Student Girl", 200, false),
    custom!(Skin, "student_boy", "👨‍🎓", "Öğrenci Erkek", "Student Boy", 200, false),
    custom!(Skin, "artist", "👩‍🎨", "Sanatçı", "Artist", 300, false),
    custom!(Skin, "dev", "👨‍💻", "Developer", "Developer", 300, false),
    custom!(Skin, "scientist", "👨‍🔬", "Bilim İnsanı", "Scientist", 400, false),
    custom!(Skin, "teacher", "👩‍🏫", "Öğretmen", "Teacher", 400, false),
    custom!(Skin, "cool", "😎", "Cool", "Cool", 0, true),
    custom!(Skin, "ninja", "🥷", "Ninja", "Ninja", 0, true),
    custom!(Outfit, "casual", "👕", "Günlük Kıyafet", "Casual", 0, false),
    custom!(Outfit, "hoodie", "🧥", "Kapşonlu", "Hoodie", 150, false),
    custom!(Outfit, "suit", "👔", "Takım Elbise", "Suit", 300, false),
    custom!(Outfit, "dress", "👗", "Elbise", "Dress", 250, false),
    custom!(Outfit, "sports", "🏃", "Spor", "Sports", 200, false),
    custom!(Outfit, "winter", "🧣", "Kışlık", "Winter", 0, true),
    custom!(Outfit, "summer", "🩳", "Yazlık", "Summer", 0, true),
    custom!(Accessory, "none", "🚫", "Yok", "None", 0, false),
    custom!(Accessory, "glasses", "👓", "Gözlük", "Glasses", 100, false),
    custom!(Accessory, "sunglasses", "🕶️", "Güneş Gözlüğü", "Sunglasses", 150, false),
    custom!(Accessory, "hat", "🎩", "Şapka", "Hat", 200, false),
    custom!(Accessory, "cap", "🧢", "Kep", "Cap", 120, false),
    custom!(Accessory, "headphones", "🎧", "Kulaklık", "Headphones", 180, false),
    custom!(Accessory, "crown", "👑", "Taç", "Crown", 0, true),
];

/// Looks up a customization item by its `<kind>_<id>` key.
pub fn find_customization(key: &str) -> Option<&'static CustomizationItem> {
    CUSTOMIZATION_ITEMS.iter().find(|item| item.key() == key)
}

/// Validates a customization purchase and returns the price to charge.
pub fn check_customization_purchase(
    item: &CustomizationItem,
    owned: &[String],
    credits: i64,
    premium_active: bool,
) -> Result<i64> {
    if item.is_default() || owned.iter().any(|o| *o == item.key()) {
        return Err(CoreError::invalid("Already owned"));
    }
    if item.premium && !premium_active {
        return Err(CoreError::Locked("Premium required".into()));
    }
    if credits < item.price {
        return Err(CoreError::invalid("Not enough credits"));
    }
    Ok(item.price)
}

/// Whether `id` of `kind` may be equipped by a user owning `owned`.
pub fn can_equip(kind: CustomizationKind, id: &str, owned: &[String]) -> bool {
    CUSTOMIZATION_ITEMS
        .iter()
        .filter(|item| item.kind == kind && item.id == id)
        .any(|item| item.is_default() || owned.iter().any(|o| *o == item.key()))
}
