//! Category-specific specification extraction
//!
//! Fixed regex sets that pull fuzzy specification keys out of a posting's
//! free text. Errand patterns run on lowercased text; the electronics and
//! book patterns are case-sensitive where units demand it (GB vs. g).

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    // Errand action keywords
    static ref RE_PICKUP: Regex = Regex::new(r"(帮忙取|代取|领取|取一下)").unwrap();
    static ref RE_PURCHASE: Regex = Regex::new(r"(代买|帮买|购买|买一下)").unwrap();
    static ref RE_DELIVERY: Regex = Regex::new(r"(帮送|投递|送达|送一下)").unwrap();
    static ref RE_GENERAL: Regex = Regex::new(r"(跑腿|帮忙)").unwrap();
    static ref RE_ITEM: Regex = Regex::new(r"(外卖|快递|文件|奶茶|食物|作业|书|钥匙|雨伞)").unwrap();
    static ref RE_QUANTITY: Regex =
        Regex::new(r"([一二三四五六七八九十\d]+)\s*(个|件|份|单|本书|箱|袋|样)").unwrap();
    static ref RE_SIZE: Regex =
        Regex::new(r"(大|小|中|重)号?(箱子|包裹|文件|东西|有点重|不重)?").unwrap();
    static ref RE_WEIGHT: Regex = Regex::new(r"(\d+(?:\.\d+)?)\s*(kg|公斤|斤|克|g)").unwrap();
    static ref RE_URGENT: Regex = Regex::new(r"(尽快|马上|急|越快越好)").unwrap();
    static ref RE_FRAGILE: Regex = Regex::new(r"(易碎|小心轻放|怕摔)").unwrap();
    static ref RE_TEMPERATURE: Regex = Regex::new(r"(保暖|冷藏|加热)").unwrap();

    // Electronics
    static ref RE_STORAGE: Regex =
        Regex::new(r"(\d+(?:\.\d+)?)\s*(GB|TB|兆|吉|太)字节?\s*(固态|机械)?硬盘?").unwrap();
    static ref RE_RAM: Regex =
        Regex::new(r"(\d+(?:\.\d+)?)\s*(GB|TB|MB|兆|吉|太)字节?\s*内存").unwrap();
    static ref RE_SCREEN: Regex = Regex::new(r"(\d+(?:\.\d+)?)\s*英寸").unwrap();
    static ref RE_CPU: Regex = Regex::new(r"([Ii][3579])\s*[- ]?\d{3,5}[A-Z]*").unwrap();

    // Books
    static ref RE_SUBJECT: Regex =
        Regex::new(r"(高等数学|线性代数|英语|计算机基础|概率论)").unwrap();
    static ref RE_EDITION: Regex = Regex::new(r"(第[一二三四五六七八九十]+版)").unwrap();
}

fn put(specs: &mut Map<String, Value>, key: &str, value: impl Into<String>) {
    specs.insert(key.to_string(), Value::String(value.into()));
}

/// Extract fuzzy errand specifications from combined name + description text.
///
/// These augment the structured keys the poster supplied (addresses, exact
/// delivery times, door-delivery flags).
pub fn extract_errand_specs(text: &str) -> Map<String, Value> {
    let mut specs = Map::new();
    let lower = text.to_lowercase();

    if RE_PICKUP.is_match(&lower) {
        put(&mut specs, "general_type_text", "pickup");
    } else if RE_PURCHASE.is_match(&lower) {
        put(&mut specs, "general_type_text", "purchase");
    } else if RE_DELIVERY.is_match(&lower) {
        put(&mut specs, "general_type_text", "delivery");
    } else if RE_GENERAL.is_match(&lower) {
        put(&mut specs, "general_type_text", "general_errand");
    }

    if let Some(m) = RE_ITEM.captures(&lower) {
        put(&mut specs, "item_text", &m[1]);
    }
    if let Some(m) = RE_QUANTITY.find(&lower) {
        put(&mut specs, "quantity_text", m.as_str());
    }
    if let Some(m) = RE_SIZE.find(&lower) {
        put(&mut specs, "size_text", m.as_str());
    }
    if let Some(m) = RE_WEIGHT.find(&lower) {
        put(&mut specs, "weight_text", m.as_str());
    }
    if RE_URGENT.is_match(&lower) {
        put(&mut specs, "urgency_text", "urgent");
    }
    if RE_FRAGILE.is_match(&lower) {
        put(&mut specs, "handling_text", "fragile");
    } else if RE_TEMPERATURE.is_match(&lower) {
        put(&mut specs, "handling_text", "temperature_sensitive");
    }

    specs
}

pub fn extract_electronic_specs(text: &str) -> Map<String, Value> {
    let mut specs = Map::new();
    if let Some(m) = RE_STORAGE.find(text) {
        put(&mut specs, "storage", m.as_str());
    }
    if let Some(m) = RE_RAM.find(text) {
        put(&mut specs, "ram", m.as_str());
    }
    if let Some(m) = RE_SCREEN.captures(text) {
        put(&mut specs, "screen_size", format!("{} inch", &m[1]));
    }
    if let Some(m) = RE_CPU.find(text) {
        put(&mut specs, "cpu", m.as_str());
    }
    specs
}

pub fn extract_book_specs(text: &str) -> Map<String, Value> {
    let mut specs = Map::new();
    if let Some(m) = RE_SUBJECT.captures(text) {
        put(&mut specs, "subject", &m[1]);
    }
    if let Some(m) = RE_EDITION.captures(text) {
        put(&mut specs, "edition", &m[1]);
    }
    specs
}

/// Dispatch extraction for a resolved category.
///
/// Categories without a pattern set (Furniture, misc buckets) extract
/// nothing; entity-level extraction needs an NER model this engine does not
/// load.
pub fn extract_specs_for_category(category: &str, name: &str, description: &str) -> Map<String, Value> {
    let text = format!("{name} {description}");
    let text = text.trim();
    match category {
        "Electronics" => extract_electronic_specs(text),
        "Books" => extract_book_specs(text),
        "Errands" => extract_errand_specs(text),
        _ => Map::new(),
    }
}
