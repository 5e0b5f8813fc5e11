//! Random display names ("Amber Otter") for connected peers

use rand::seq::SliceRandom;

const COLORS: &[&str] = &[
    "red", "orange", "yellow", "green", "blue", "purple", "violet", "indigo", "pink", "brown",
    "black", "white", "gray", "silver", "gold", "bronze", "crimson", "scarlet", "vermilion",
    "amber", "ochre", "lemon", "lime", "emerald", "teal", "cyan", "azure", "navy", "sapphire",
    "cobalt", "lavender", "lilac", "magenta", "maroon", "burgundy", "rose", "coral", "peach",
    "apricot", "beige", "cream", "ivory", "charcoal", "ebony", "golden", "silvery", "copper",
    "brass", "russet", "umber", "sepia", "turquoise", "aqua", "jade", "olive", "mustard",
    "honey", "salmon", "tangerine", "plum", "mauve", "wine", "ruby", "garnet", "amethyst",
    "topaz", "pearl", "opal", "jet", "onyx",
];

const ANIMALS: &[&str] = &[
    "ape", "baboon", "badger", "bat", "bear", "beaver", "bison", "boar", "buffalo", "camel",
    "cat", "cheetah", "chimpanzee", "cow", "coyote", "crocodile", "deer", "dog", "dolphin",
    "donkey", "elephant", "elk", "ferret", "fox", "frog", "gazelle", "giraffe", "goat",
    "gorilla", "hamster", "hare", "hedgehog", "hippopotamus", "horse", "hyena", "jaguar",
    "kangaroo", "koala", "leopard", "lion", "llama", "lynx", "mole", "mongoose", "monkey",
    "moose", "mouse", "otter", "panda", "panther", "pig", "platypus", "porcupine", "possum",
    "rabbit", "raccoon", "rat", "rhinoceros", "seal", "sheep", "skunk", "sloth", "snake",
    "squirrel", "tiger", "walrus", "weasel", "wolf", "wolverine", "zebra", "alligator",
    "antelope", "armadillo", "beetle", "butterfly", "caterpillar", "centipede", "crab", "eagle",
    "falcon", "hawk", "owl", "parrot", "peacock", "penguin", "robin", "seagull", "sparrow",
    "swan", "turtle", "tortoise", "woodpecker", "worm", "alpaca", "caribou", "chinchilla",
    "duck", "flamingo", "gecko", "iguana", "lemur", "meerkat", "narwhal", "octopus", "puma",
    "quokka", "reindeer", "shark", "toucan", "urchin", "vulture", "wombat", "yak",
];

/// Generate a title-cased "Color Animal" display name
pub fn generate_name() -> String {
    let mut rng = rand::thread_rng();
    let color = COLORS.choose(&mut rng).copied().unwrap_or("grey");
    let animal = ANIMALS.choose(&mut rng).copied().unwrap_or("cat");
    format!("{} {}", title_case(color), title_case(animal))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
