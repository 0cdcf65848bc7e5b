//! 合成数据生成：微信风格昵称、手机号、头像色
//!
//! 昵称有四种互换的生成策略，每条记录独立等概率选一种。
//! 策略与字符池是产品行为的一部分，不要随意增删。

use rand::Rng;

/// 头像背景色池
pub const AVATAR_COLORS: [&str; 8] = [
    "#3498db", "#2ecc71", "#e74c3c", "#f39c12", "#9b59b6", "#1abc9c", "#d35400", "#34495e",
];

/// 中文网名池
const PHRASES: [&str; 52] = [
    "小可爱", "阳光", "微笑", "快乐", "幸福", "温柔", "可爱多", "甜心", "暖暖",
    "星星", "月亮", "天空", "海洋", "云朵", "雨滴", "雪花", "花朵", "草莓", "柠檬",
    "奶茶", "咖啡", "巧克力", "冰淇淋", "蛋糕", "糖果", "棒棒糖", "果冻", "布丁",
    "小仙女", "小王子", "小公主", "小天使", "小魔王", "小恶魔", "小精灵", "小妖精",
    "大宝贝", "小宝贝", "小可爱", "小甜心", "小宝宝", "小朋友", "小可爱", "小甜甜",
    "阿狸", "皮卡丘", "哆啦A梦", "小熊维尼", "米老鼠", "唐老鸭", "加菲猫", "史努比",
];

/// 英文名池
const LATIN_NAMES: [&str; 40] = [
    "Amy", "Bob", "Cathy", "David", "Emma", "Frank", "Grace", "Henry", "Ivy", "Jack",
    "Kelly", "Leo", "Mia", "Nick", "Olivia", "Peter", "Queen", "Ryan", "Sophia", "Tom",
    "Uma", "Victor", "Wendy", "Xander", "Yolanda", "Zack", "Alice", "Ben", "Cindy", "Daniel",
    "Ella", "Felix", "Gina", "Harry", "Irene", "Jason", "Kate", "Liam", "Megan", "Nathan",
];

/// emoji 池
const EMOJIS: [&str; 30] = [
    "😊", "😄", "😍", "🥰", "😎", "🤩", "🌟", "✨", "🌈", "🌸", "🌺", "🌼", "🌻", "🍀", "🍓",
    "🍒", "🍎", "🍉", "🍭", "🍬", "🧸", "🎀", "🎵", "🎮", "📱", "💻", "📷", "🏀", "⚽", "🏆",
];

/// emoji 策略使用的基础名池
const EMOJI_BASE_NAMES: [&str; 13] = [
    "小可爱", "阳光", "微笑", "快乐", "幸福", "温柔", "Amy", "Bob", "Cathy", "David", "Emma",
    "Frank", "Grace",
];

/// 传统姓氏池
const SURNAMES: [&str; 32] = [
    "赵", "钱", "孙", "李", "周", "吴", "郑", "王", "冯", "陈", "褚", "卫", "蒋", "沈", "韩",
    "杨", "朱", "秦", "尤", "许", "何", "吕", "施", "张", "孔", "曹", "严", "华", "金", "魏",
    "陶", "姜",
];

/// 名字用字池
const GIVEN_NAME_CHARS: [char; 31] = [
    '明', '东', '林', '华', '国', '建', '立', '志', '远', '山', '水', '木', '火', '土', '金',
    '天', '正', '平', '学', '诚', '如', '荣', '宝', '永', '祥', '伟', '涛', '强', '军', '磊',
    '晓',
];

/// 昵称生成策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NicknameStrategy {
    /// 固定中文网名
    Phrase,
    /// 英文名，50% 概率追加 0-999 的数字
    LatinName,
    /// 基础名前置或后置一个 emoji（各 50%）
    Emoji,
    /// 姓氏 + 一到两个名字用字（30% 概率为两字名）
    ChineseName,
}

impl NicknameStrategy {
    /// 等概率随机选择一种策略
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.gen_range(0..4) {
            0 => NicknameStrategy::Phrase,
            1 => NicknameStrategy::LatinName,
            2 => NicknameStrategy::Emoji,
            _ => NicknameStrategy::ChineseName,
        }
    }

    /// 按当前策略生成一个昵称
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        match self {
            NicknameStrategy::Phrase => {
                PHRASES[rng.gen_range(0..PHRASES.len())].to_string()
            }
            NicknameStrategy::LatinName => {
                let name = LATIN_NAMES[rng.gen_range(0..LATIN_NAMES.len())];
                if rng.gen_bool(0.5) {
                    format!("{}{}", name, rng.gen_range(0..1000))
                } else {
                    name.to_string()
                }
            }
            NicknameStrategy::Emoji => {
                let name = EMOJI_BASE_NAMES[rng.gen_range(0..EMOJI_BASE_NAMES.len())];
                let emoji = EMOJIS[rng.gen_range(0..EMOJIS.len())];
                if rng.gen_bool(0.5) {
                    format!("{}{}", emoji, name)
                } else {
                    format!("{}{}", name, emoji)
                }
            }
            NicknameStrategy::ChineseName => {
                let surname = SURNAMES[rng.gen_range(0..SURNAMES.len())];
                let given_len = if rng.gen_bool(0.3) { 2 } else { 1 };
                let mut name = surname.to_string();
                for _ in 0..given_len {
                    name.push(GIVEN_NAME_CHARS[rng.gen_range(0..GIVEN_NAME_CHARS.len())]);
                }
                name
            }
        }
    }
}

/// 随机策略生成一个昵称
pub fn random_nickname<R: Rng + ?Sized>(rng: &mut R) -> String {
    NicknameStrategy::random(rng).generate(rng)
}

/// 从固定色池随机取一个头像背景色
pub fn random_avatar_color<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    AVATAR_COLORS[rng.gen_range(0..AVATAR_COLORS.len())]
}

/// 合成一个展示用手机号："1" + 1-9 的一位数字 + 8 位随机数字
pub fn synth_phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("1{}{:08}", rng.gen_range(1..=9), rng.gen_range(0..100_000_000u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_comes_from_pool() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let name = NicknameStrategy::Phrase.generate(&mut rng);
            assert!(PHRASES.contains(&name.as_str()));
        }
    }

    #[test]
    fn test_latin_name_optional_suffix() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let name = NicknameStrategy::LatinName.generate(&mut rng);
            let stem: String = name.chars().take_while(|c| !c.is_ascii_digit()).collect();
            assert!(LATIN_NAMES.contains(&stem.as_str()), "异常昵称: {}", name);
            let suffix: String = name.chars().skip_while(|c| !c.is_ascii_digit()).collect();
            if !suffix.is_empty() {
                let n: u32 = suffix.parse().expect("数字后缀解析失败");
                assert!(n < 1000);
            }
        }
    }

    #[test]
    fn test_emoji_wraps_base_name() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let name = NicknameStrategy::Emoji.generate(&mut rng);
            assert!(
                EMOJI_BASE_NAMES.iter().any(|base| name.contains(base)),
                "异常昵称: {}",
                name
            );
            assert!(EMOJIS.iter().any(|e| name.contains(e)), "异常昵称: {}", name);
        }
    }

    #[test]
    fn test_chinese_name_shape() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let name = NicknameStrategy::ChineseName.generate(&mut rng);
            let chars: Vec<char> = name.chars().collect();
            assert!(chars.len() == 2 || chars.len() == 3, "异常昵称: {}", name);
            let surname = chars[0].to_string();
            assert!(SURNAMES.contains(&surname.as_str()));
            for c in &chars[1..] {
                assert!(GIVEN_NAME_CHARS.contains(c));
            }
        }
    }

    #[test]
    fn test_synth_phone_shape() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let phone = synth_phone(&mut rng);
            assert_eq!(phone.len(), 10);
            assert!(phone.starts_with('1'));
            assert!(phone.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(phone.as_bytes()[1], b'0');
        }
    }
}
