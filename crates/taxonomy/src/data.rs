//! Built-in MRO taxonomy data set.
//!
//! One department (D03) with 16 categories and their subcategories, codes and
//! Portuguese names as shipped in the source catalog.

use crate::catalog::TaxonomyCatalog;

type Subcategories = &'static [(&'static str, &'static str)];
type Categories = &'static [(&'static str, &'static str, Subcategories)];
type Departments = &'static [(&'static str, &'static str, Categories)];

const S09_SUBS: Subcategories = &[
    ("C037", "Barras de aço"),
    ("C060", "Chapas"),
    ("C114", "Ferros Chatos"),
    ("C190", "Formas"),
    ("C201", "Hastes"),
    ("C229", "Tarugos"),
];

const S17_SUBS: Subcategories = &[
    ("C001", "Baterias lítio"),
    ("C056", "Baterias níquel"),
    ("C110", "Baterias tracionárias"),
    ("C187", "Outras baterias"),
];

const S25_SUBS: Subcategories = &[
    ("C002", "Bombas"),
    ("C057", "Chaves e compressores"),
    ("C111", "Hélices"),
    ("C188", "Juntas para bomba"),
    ("C199", "Motobombas"),
    ("C228", "Motores"),
    ("C274", "Motovibradores"),
    ("C293", "Outros componentes bombas e motores"),
    ("C311", "Rotores"),
    ("C326", "Servomotores"),
];

const S36_SUBS: Subcategories = &[
    ("C042", "Correntes"),
    ("C095", "Emendas"),
    ("C145", "Engrenagens"),
    ("C175", "Manilhas"),
    ("C221", "Olhal"),
    ("C247", "Outras correntes e engrenagens"),
    ("C268", "Engates"),
];

const S39_SUBS: Subcategories = &[
    ("C026", "Acoplamentos"),
    ("C080", "Adesivos e fitas"),
    ("C133", "Anéis elásticos"),
    ("C164", "Chumbadores"),
    ("C215", "Eletrodos de soldas"),
    ("C241", "Gaxetas"),
    ("C270", "Juntas de vedação"),
    ("C291", "Outros elementos de fixação e vedação"),
    ("C297", "Retentores"),
    ("C308", "Parafusos, pregos, porcas, buchas e arruelas"),
    ("C325", "Rebites e pinos"),
];

const S41_SUBS: Subcategories = &[
    ("C027", "Abrasivos"),
    ("C081", "Ferramentas de corte e desbaste"),
    ("C134", "Outras ferramentas manuais"),
    ("C165", "Ferramentas para construção civil"),
    ("C216", "Ferramentas perfuradoras"),
    ("C739", "Acessórios e consumíveis para ferramentas"),
    ("C740", "Alicates"),
    ("C741", "Chave allen/hexagonal"),
    ("C742", "Chave biela"),
    ("C743", "Chave combinada"),
    ("C744", "Chave de fenda e Phillips"),
    ("C745", "Ferramentas a bateria"),
    ("C746", "Ferramentas automotivas"),
    ("C747", "Ferramentas de medição"),
    ("C748", "Ferramentas elétricas"),
    ("C749", "Ferramentas para jardim"),
    ("C750", "Ferramentas para pintura"),
    ("C751", "Ferramentas para solda"),
    ("C752", "Jogos de chave combinada"),
    ("C753", "Jogos de ferramentas"),
    ("C754", "Jogos de soquetes"),
    ("C755", "Torquímetro"),
];

const S43_SUBS: Subcategories = &[
    ("C028", "Lonas e toldos"),
    ("C082", "Outros materiais MRO"),
    ("C772", "Adubos e fertilizantes"),
];

const S46_SUBS: Subcategories = &[
    ("C029", "Adaptadores, conexões e terminais"),
    ("C083", "Amortecedor"),
    ("C135", "Atuador pneumático"),
    ("C166", "Balancin"),
    ("C217", "Cilindros"),
    ("C242", "Eletroválvulas"),
    ("C289", "Engates rápidos"),
    ("C307", "Filtros de água"),
    ("C324", "Filtros de ar"),
    ("C337", "Filtros de gás"),
    ("C346", "Filtros industriais"),
    ("C358", "Flanges"),
    ("C366", "Luvas hidráulicas"),
    ("C377", "Mangueiras hidráulicas e industriais"),
    ("C390", "Outros materiais hidráulicos ou pneumáticos"),
    ("C395", "União"),
    ("C400", "Válvulas"),
    ("C719", "Filtros"),
    ("C722", "Válvulas"),
];

const S47_SUBS: Subcategories = &[
    ("C025", "Amplificadores"),
    ("C079", "Conduletes"),
    ("C132", "Fontes de energia"),
    ("C163", "Fusíveis e disjuntores"),
    ("C240", "Módulos"),
    ("C269", "Outros componentes eletrônicos"),
    ("C290", "Outros materiais elétricos"),
    ("C314", "Plugs e adaptadores"),
    ("C329", "Resistências"),
    ("C340", "Terminais"),
    ("C350", "Tomadas e interruptores"),
    ("C360", "Transformadores"),
    ("C773", "Cabos e fios elétricos"),
    ("C774", "Chaves magnéticas"),
    ("C775", "Contatores"),
    ("C776", "Energia solar"),
    ("C777", "Extensões elétricas e filtros de linha"),
    ("C778", "Ferramentas de eletricista"),
    ("C779", "Quadros e caixas elétricas"),
    ("C780", "Reatores e soquetes"),
    ("C781", "Tubos e eletrodutos"),
];

const S49_SUBS: Subcategories = &[
    ("C048", "Aditivos"),
    ("C103", "Graxas"),
    ("C150", "Óleos lubrificantes"),
    ("C183", "Outros fluidos"),
];

const S51_SUBS: Subcategories = &[
    ("C049", "Amortecedores"),
    ("C104", "Antiderrapantes para correias"),
    ("C151", "Correias e componentes"),
    ("C184", "Mancal"),
    ("C223", "Molas"),
    ("C253", "Outros componentes de partes mecânicas"),
    ("C275", "Polias"),
    ("C315", "Rolamentos"),
    ("C330", "Tensores de correias"),
    ("C382", "Molas"),
];

const S54_SUBS: Subcategories = &[
    ("C051", "Conexões"),
    ("C097", "Cotovelos"),
    ("C152", "Joelhos"),
    ("C178", "Luvas"),
    ("C224", "Niples PVC"),
    ("C249", "Tubos"),
    ("C278", "União"),
];

const S71_SUBS: Subcategories = &[
    ("C716", "Conexões"),
    ("C717", "Engates"),
    ("C718", "Esteira"),
    ("C719", "Filtros"),
    ("C720", "Mangueiras"),
    ("C721", "Outros materiais de automação industrial"),
    ("C722", "Válvulas"),
    ("C723", "Ventosas"),
];

const S72_SUBS: Subcategories = &[
    ("C724", "Bobinas kraft ou semi kraft"),
    ("C725", "Caixas de papelão"),
    ("C726", "Embalagens descartáveis"),
    ("C727", "Embalagens para delivery"),
    ("C728", "Envelopes de segurança"),
    ("C729", "Etiquetas e tags"),
    ("C730", "Filme stretch"),
    ("C731", "Fitas adesivas"),
    ("C732", "Fitas, laços e cordões"),
    ("C733", "Lacres"),
    ("C734", "Latas"),
    ("C735", "Pallets"),
    ("C736", "Potes e vidros"),
    ("C737", "Sacos e sacolas kraft"),
    ("C738", "Sacos e sacolas plásticas"),
];

const S73_SUBS: Subcategories = &[
    ("C214", "Outros objetos de iluminação"),
    ("C756", "Abajures e cúpulas"),
    ("C757", "Cordões de luz"),
    ("C758", "Fitas de LED"),
    ("C759", "Kits de lâmpadas"),
    ("C760", "Lâmpadas de LED"),
    ("C761", "Lâmpadas fluorescentes"),
    ("C762", "Lâmpadas halógenas"),
    ("C763", "Lâmpadas incandescentes"),
    ("C764", "Lâmpadas inteligentes"),
    ("C765", "Luminárias"),
    ("C766", "Lustres e pendentes"),
    ("C767", "Outros tipos de lâmpadas"),
    ("C768", "Painel de LED"),
    ("C769", "Refletores"),
    ("C770", "Soquetes para lâmpadas"),
    ("C771", "Spots"),
];

const S74_SUBS: Subcategories = &[
    ("C782", "Ácidos"),
    ("C783", "Gases"),
    ("C784", "Metais químicos"),
    ("C785", "Químicos inorgânicos"),
    ("C786", "Químicos orgânicos"),
    ("C787", "Reagentes químicos"),
    ("C788", "Solventes"),
];

const D03_CATEGORIES: Categories = &[
    ("S09", "BARRAS E CHAPAS", S09_SUBS),
    ("S17", "BATERIAS", S17_SUBS),
    ("S25", "BOMBAS E MOTORES", S25_SUBS),
    ("S36", "CORRENTES METÁLICAS E ENGRENAGENS", S36_SUBS),
    ("S39", "ELEMENTOS DE FIXAÇÃO E VEDAÇÃO", S39_SUBS),
    ("S41", "FERRAMENTAS", S41_SUBS),
    ("S43", "MATERIAIS DIVERSOS", S43_SUBS),
    (
        "S46",
        "MATERIAIS HIDRÁULICOS, PNEUMÁTICOS, FILTROS E VÁLVULAS",
        S46_SUBS,
    ),
    ("S47", "MATERIAIS ELÉTRICOS E ELETRÔNICOS", S47_SUBS),
    ("S49", "LUBRIFICANTES", S49_SUBS),
    ("S51", "PARTES MECÂNICAS, ROLAMENTOS E CORREIAS", S51_SUBS),
    ("S54", "TUBOS E CONEXÕES", S54_SUBS),
    ("S71", "AUTOMAÇÃO INDUSTRIAL", S71_SUBS),
    ("S72", "EMBALAGENS", S72_SUBS),
    ("S73", "ILUMINAÇÃO", S73_SUBS),
    ("S74", "QUÍMICOS INDUSTRIAIS", S74_SUBS),
];

const MRO_TAXONOMY: Departments = &[(
    "D03",
    "MRO: MATERIAL, REPARO E OPERAÇÃO",
    D03_CATEGORIES,
)];

impl TaxonomyCatalog {
    /// The built-in MRO taxonomy.
    pub fn builtin() -> Self {
        Self::from_entries(MRO_TAXONOMY)
    }
}
