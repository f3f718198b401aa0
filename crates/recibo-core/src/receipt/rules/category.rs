//! Keyword-based category suggestion.

use tracing::trace;

use crate::models::Category;

/// A rule fires when any keyword is a substring of the lower-cased text.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub keywords: &'static [&'static str],
    pub category: Category,
}

/// Evaluated top to bottom; the first matching rule wins.
pub static CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        keywords: &["posto", "combust"],
        category: Category::Fuel,
    },
    CategoryRule {
        keywords: &["hotel", "hosped"],
        category: Category::Lodging,
    },
    CategoryRule {
        keywords: &["churrasc", "restaur", "lanche", "almoço", "jantar"],
        category: Category::Food,
    },
    CategoryRule {
        keywords: &["farm", "dercos", "vichy", "nivea", "remédio", "medic"],
        category: Category::Pharmacy,
    },
    CategoryRule {
        keywords: &["mercado", "supermercado"],
        category: Category::Food,
    },
    CategoryRule {
        keywords: &["energia", "luz", "coelba"],
        category: Category::Energy,
    },
    CategoryRule {
        keywords: &["água", "agua", "embasa"],
        category: Category::Water,
    },
    CategoryRule {
        keywords: &["mensalidade", "diária", "diarias", "escola", "reforço", "arco-iris"],
        category: Category::Education,
    },
    CategoryRule {
        keywords: &["uber", "99app", "transporte"],
        category: Category::Transport,
    },
];

impl CategoryRule {
    /// First keyword found in already lower-cased text.
    pub fn matched_keyword(&self, lowered: &str) -> Option<&'static str> {
        self.keywords.iter().copied().find(|k| lowered.contains(k))
    }
}

/// Suggest a category for `text`, or `default` when no rule matches.
pub fn classify(text: &str, default: Category) -> Category {
    let lowered = text.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find_map(|rule| {
            rule.matched_keyword(&lowered).map(|keyword| {
                trace!("category {:?} via keyword {:?}", rule.category, keyword);
                rule.category
            })
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_fuel() {
        assert_eq!(classify("Compra no Posto Ipiranga", Category::Unknown), Category::Fuel);
        assert_eq!(classify("COMBUSTÍVEL ADITIVADO", Category::Unknown), Category::Fuel);
    }

    #[test]
    fn test_classify_default() {
        assert_eq!(classify("texto aleatório", Category::Unknown), Category::Unknown);
        assert_eq!(classify("texto aleatório", Category::Food), Category::Food);
    }

    #[test]
    fn test_classify_each_rule() {
        let cases = [
            ("Hotel Pelourinho", Category::Lodging),
            ("Churrascaria Boi Preto", Category::Food),
            ("Drogaria e Farmácia Pague Menos", Category::Pharmacy),
            ("Supermercado Bom Preço", Category::Food),
            ("Conta de energia COELBA", Category::Energy),
            ("EMBASA fatura", Category::Water),
            ("Mensalidade outubro", Category::Education),
            ("Viagem Uber", Category::Transport),
        ];
        for (text, expected) in cases {
            assert_eq!(classify(text, Category::Unknown), expected, "{}", text);
        }
    }

    #[test]
    fn test_earlier_rule_wins() {
        // "posto" (fuel) is checked before "mercado" (food).
        assert_eq!(
            classify("Mercado do Posto Central", Category::Unknown),
            Category::Fuel
        );
        // "farm" (pharmacy) is checked before "supermercado".
        assert_eq!(
            classify("Supermercado com farmácia", Category::Unknown),
            Category::Pharmacy
        );
    }

    #[test]
    fn test_rule_table_order() {
        let order: Vec<Category> = CATEGORY_RULES.iter().map(|r| r.category).collect();
        assert_eq!(order.first(), Some(&Category::Fuel));
        assert_eq!(order.last(), Some(&Category::Transport));
        assert_eq!(order.len(), 9);
    }
}
